//! Growable, typed, fixed-element-size arrays backed by raw memory.
//!
//! Graphs derived from continental-scale map data exceed comfortable ordinary
//! allocation sizes and want deterministic reclamation, so every large table
//! in this crate sits on a `HugeArray` instead of a `Vec`. The backing store
//! lives outside any container bookkeeping: a single raw allocation which is
//! reallocated wholesale on `resize` and freed exactly once on `dispose`
//! (or drop). Newly grown elements are always zero bytes.
//!
//! Only element types with a fixed byte width out of `{1, 2, 4, 8}` are
//! supported. The width is validated once at construction, not per access.

use crate::algo::Error;
use std::alloc::{alloc_zeroed, dealloc, handle_alloc_error, realloc, Layout};
use std::io::{Read, Result, Write};
use std::marker::PhantomData;
use std::{fmt, mem, ptr, slice};

/// Marker trait for element types which may live in a `HugeArray`.
///
/// # Safety
///
/// Implementors must be plain old data: any bit pattern, including all
/// zeroes, must be a valid value, because the array zero-initializes grown
/// regions and deserializes elements by raw byte copy.
pub unsafe trait FixedWidth: Copy + 'static {}

unsafe impl FixedWidth for u8 {}
unsafe impl FixedWidth for i8 {}
unsafe impl FixedWidth for u16 {}
unsafe impl FixedWidth for i16 {}
unsafe impl FixedWidth for u32 {}
unsafe impl FixedWidth for i32 {}
unsafe impl FixedWidth for u64 {}
unsafe impl FixedWidth for i64 {}
unsafe impl FixedWidth for f32 {}
unsafe impl FixedWidth for f64 {}

// Chunk size for streaming transfers, bounds peak buffer use.
const STREAM_CHUNK_BYTES: usize = 81920;

/// A growable off-heap array of a fixed-width element type.
pub struct HugeArray<T: FixedWidth> {
    head: *mut u8,
    len: usize,
    _phantom: PhantomData<T>,
}

// The array is an exclusively owned allocation, aliasing rules are the same
// as for a boxed slice.
unsafe impl<T: FixedWidth + Send> Send for HugeArray<T> {}
unsafe impl<T: FixedWidth + Sync> Sync for HugeArray<T> {}

impl<T: FixedWidth> HugeArray<T> {
    /// Create an array of `len` zeroed elements.
    ///
    /// Fails with `Error::UnsupportedElementType` for element widths outside
    /// the supported set without allocating anything.
    pub fn new(len: usize) -> std::result::Result<HugeArray<T>, Error> {
        let width = mem::size_of::<T>();
        if !matches!(width, 1 | 2 | 4 | 8) {
            return Err(Error::UnsupportedElementType { width });
        }

        let mut array = HugeArray {
            head: ptr::null_mut(),
            len: 0,
            _phantom: PhantomData,
        };
        array.resize(len);
        Ok(array)
    }

    /// Number of elements in the array.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn layout(len: usize) -> Layout {
        Layout::array::<T>(len).expect("HugeArray capacity overflow")
    }

    /// Grow or shrink the array to `new_len` elements.
    ///
    /// Existing elements up to `min(len, new_len)` are preserved, grown
    /// elements are zeroed. The entire backing store is reallocated, callers
    /// must expect O(len) cost.
    pub fn resize(&mut self, new_len: usize) {
        if new_len == self.len {
            return;
        }
        if new_len == 0 {
            self.dispose();
            return;
        }

        let old_bytes = self.len * mem::size_of::<T>();
        let new_bytes = new_len * mem::size_of::<T>();
        let new_layout = Self::layout(new_len);

        unsafe {
            if self.head.is_null() {
                debug_assert_eq!(self.len, 0);
                self.head = alloc_zeroed(new_layout);
                if self.head.is_null() {
                    handle_alloc_error(new_layout);
                }
            } else {
                let moved = realloc(self.head, Self::layout(self.len), new_bytes);
                if moved.is_null() {
                    handle_alloc_error(new_layout);
                }
                self.head = moved;
                if new_bytes > old_bytes {
                    ptr::write_bytes(self.head.add(old_bytes), 0, new_bytes - old_bytes);
                }
            }
        }

        self.len = new_len;
    }

    /// Release the backing storage. Idempotent, also invoked on drop.
    pub fn dispose(&mut self) {
        if self.head.is_null() {
            debug_assert_eq!(self.len, 0);
            return;
        }
        unsafe {
            dealloc(self.head, Self::layout(self.len));
        }
        self.head = ptr::null_mut();
        self.len = 0;
    }

    #[inline]
    pub fn get(&self, index: usize) -> T {
        assert!(index < self.len);
        unsafe { ptr::read((self.head as *const T).add(index)) }
    }

    #[inline]
    pub fn set(&mut self, index: usize, value: T) {
        assert!(index < self.len);
        unsafe { ptr::write((self.head as *mut T).add(index), value) }
    }

    pub fn as_slice(&self) -> &[T] {
        if self.head.is_null() {
            &[]
        } else {
            unsafe { slice::from_raw_parts(self.head as *const T, self.len) }
        }
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        if self.head.is_null() {
            &mut []
        } else {
            unsafe { slice::from_raw_parts_mut(self.head as *mut T, self.len) }
        }
    }

    fn byte_len(&self) -> usize {
        self.len * mem::size_of::<T>()
    }

    /// Write the raw element bytes to `writer` in bounded chunks.
    /// Returns the total number of bytes written.
    pub fn copy_to(&self, writer: &mut dyn Write) -> Result<u64> {
        let total = self.byte_len();
        let mut written = 0;
        while written < total {
            let chunk = std::cmp::min(STREAM_CHUNK_BYTES, total - written);
            let bytes = unsafe { slice::from_raw_parts(self.head.add(written), chunk) };
            writer.write_all(bytes)?;
            written += chunk;
        }
        Ok(total as u64)
    }

    /// Fill the array with raw element bytes from `reader` in bounded chunks.
    ///
    /// The reader must yield exactly `len * size_of::<T>()` bytes, a short
    /// stream fails with `UnexpectedEof` (corrupt input).
    pub fn copy_from(&mut self, reader: &mut dyn Read) -> Result<()> {
        let total = self.byte_len();
        let mut filled = 0;
        while filled < total {
            let chunk = std::cmp::min(STREAM_CHUNK_BYTES, total - filled);
            let bytes = unsafe { slice::from_raw_parts_mut(self.head.add(filled), chunk) };
            reader.read_exact(bytes)?;
            filled += chunk;
        }
        Ok(())
    }
}

impl<T: FixedWidth> Drop for HugeArray<T> {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl<T: FixedWidth> std::ops::Index<usize> for HugeArray<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        &self.as_slice()[index]
    }
}

impl<T: FixedWidth> std::ops::IndexMut<usize> for HugeArray<T> {
    fn index_mut(&mut self, index: usize) -> &mut T {
        &mut self.as_mut_slice()[index]
    }
}

impl<T: FixedWidth + fmt::Debug> fmt::Debug for HugeArray<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_list().entries(self.as_slice().iter()).finish()
    }
}

impl<T: FixedWidth> FromIterator<T> for HugeArray<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let elements: Vec<T> = iter.into_iter().collect();
        let mut array = HugeArray::new(elements.len()).expect("element width validated by the closed FixedWidth set");
        array.as_mut_slice().copy_from_slice(&elements);
        array
    }
}
