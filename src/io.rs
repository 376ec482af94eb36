//! Utilities for reading and writing data structures from and to disk.
//!
//! Every persisted table is a raw, stream-ordered, element-aligned binary
//! block, one file per array. There is no self-describing framing: the reader
//! derives the element count from the file size and the schema-known element
//! width. Import the `Load` and `Store` traits and use the `load_from` and
//! `write_to` methods, or `Deconstruct`/`Reconstruct` for multi-file objects.

use crate::datastr::huge_array::{FixedWidth, HugeArray};
use std::{
    ffi::OsStr,
    fs::{metadata, File},
    io::{prelude::*, Error, ErrorKind, Result},
    mem,
    path::Path,
    slice,
};

/// A trait which allows accessing the data of an object as a slice of bytes.
/// The bytes represent the serialization of the object.
///
/// Do not use this trait directly but rather the `Store` trait.
pub trait DataBytes {
    /// Should return the serialized object as a slice of bytes
    fn data_bytes(&self) -> &[u8];
}

/// A trait which mutably exposes the internal data of an object so that
/// a serialized object can be read back into a precreated object of the
/// right size.
///
/// Do not use this trait directly but rather the `Load` trait.
pub trait DataBytesMut {
    /// Should return a mutable slice of the internal data of the object
    fn data_bytes_mut(&mut self) -> &mut [u8];
}

impl<T: Copy> DataBytes for [T] {
    fn data_bytes(&self) -> &[u8] {
        let num_bytes = self.len() * mem::size_of::<T>();
        unsafe { slice::from_raw_parts(self.as_ptr() as *const u8, num_bytes) }
    }
}

impl<T: Copy> DataBytes for Vec<T> {
    fn data_bytes(&self) -> &[u8] {
        self[..].data_bytes()
    }
}

impl<T: Copy> DataBytesMut for [T] {
    fn data_bytes_mut(&mut self) -> &mut [u8] {
        let num_bytes = self.len() * mem::size_of::<T>();
        unsafe { slice::from_raw_parts_mut(self.as_mut_ptr() as *mut u8, num_bytes) }
    }
}

impl<T: Copy> DataBytesMut for Vec<T> {
    fn data_bytes_mut(&mut self) -> &mut [u8] {
        self[..].data_bytes_mut()
    }
}

/// A trait which exposes a method to write objects to disk as raw blocks.
pub trait Store {
    /// Writes the serialized object to the file with the given path
    fn write_to(&self, path: &dyn AsRef<Path>) -> Result<()>;
}

impl<T: DataBytes> Store for T {
    fn write_to(&self, path: &dyn AsRef<Path>) -> Result<()> {
        File::create(path)?.write_all(self.data_bytes())
    }
}

impl<T: Copy> Store for [T] {
    fn write_to(&self, path: &dyn AsRef<Path>) -> Result<()> {
        File::create(path)?.write_all(self.data_bytes())
    }
}

impl<T: FixedWidth> Store for HugeArray<T> {
    fn write_to(&self, path: &dyn AsRef<Path>) -> Result<()> {
        self.copy_to(&mut File::create(path)?).map(|_| ())
    }
}

/// A trait to load raw serialized data back into objects.
pub trait Load: Sized {
    /// Create an object of the correct size for serialized data with the
    /// given number of bytes. Fails if the byte count is not a multiple of
    /// the element width.
    fn new_with_bytes(num_bytes: usize) -> Result<Self>;

    /// Fill the precreated object from the stream.
    fn fill_from(&mut self, reader: &mut dyn Read) -> Result<()>;

    /// Load serialized data from disk, create an object of the appropriate
    /// size, deserialize the bytes into the object and return it.
    fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let num_bytes = metadata(path.as_ref())?.len() as usize;
        let mut object = Self::new_with_bytes(num_bytes)?;
        object.fill_from(&mut File::open(path)?)?;
        Ok(object)
    }
}

fn element_count<T>(num_bytes: usize) -> Result<usize> {
    if num_bytes % mem::size_of::<T>() != 0 {
        return Err(Error::new(
            ErrorKind::InvalidData,
            "file size is not a multiple of the element width",
        ));
    }
    Ok(num_bytes / mem::size_of::<T>())
}

impl<T: Default + Copy> Load for Vec<T> {
    fn new_with_bytes(num_bytes: usize) -> Result<Self> {
        Ok(vec![T::default(); element_count::<T>(num_bytes)?])
    }

    fn fill_from(&mut self, reader: &mut dyn Read) -> Result<()> {
        reader.read_exact(self.data_bytes_mut())
    }
}

impl<T: FixedWidth> Load for HugeArray<T> {
    fn new_with_bytes(num_bytes: usize) -> Result<Self> {
        HugeArray::new(element_count::<T>(num_bytes)?).map_err(|err| Error::new(ErrorKind::InvalidInput, err))
    }

    fn fill_from(&mut self, reader: &mut dyn Read) -> Result<()> {
        self.copy_from(reader)
    }
}

/// A trait to allow serializing objects which need more than a single file.
pub trait Deconstruct: Sized {
    /// Will be called indirectly and should call the `store_callback` for
    /// each file that should be written to disk. The first param is a name
    /// to identify the file, the second the data to be stored.
    fn store_each(&self, store_callback: &dyn Fn(&str, &dyn Store) -> Result<()>) -> Result<()>;

    /// Call with a directory arg to store this object in this directory.
    fn deconstruct_to<D: AsRef<OsStr>>(&self, dir: &D) -> Result<()> {
        let path = Path::new(dir);
        std::fs::create_dir_all(path)?;
        self.store_each(&|name, object: &dyn Store| object.write_to(&path.join(name)))
    }
}

/// Helper struct for loading multiple objects back from disk.
#[derive(Debug)]
pub struct Loader<'a> {
    path: &'a Path,
}

impl<'a> Loader<'a> {
    /// Call this method for each file that should be loaded back from disk.
    /// The path param should be the same name that was used with the
    /// `store_each` callback.
    pub fn load<T: Load, P: AsRef<Path>>(&self, path: P) -> Result<T> {
        T::load_from(self.path.join(path))
    }
}

/// A trait to allow deserializing objects which need more than a single file.
pub trait Reconstruct: Sized {
    /// Will be called indirectly and should use the loader passed along to
    /// load all the necessary objects back.
    fn reconstruct_with(loader: Loader) -> Result<Self>;

    /// Call with a directory arg to reconstruct an object from this directory.
    fn reconstruct_from<D: AsRef<OsStr>>(dir: &D) -> Result<Self> {
        let path = Path::new(dir);
        Self::reconstruct_with(Loader { path })
    }
}
