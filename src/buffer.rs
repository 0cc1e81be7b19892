use std::alloc::{self, Layout};
use std::mem;
use std::ptr::NonNull;

/// Uninitialized storage for exactly `cap` values of `T`.
///
/// The buffer never grows: blocks are sized once, when they are created.
#[derive(Debug)]
pub struct Buffer<T> {
    pub ptr: NonNull<T>,
    pub cap: usize,
}

unsafe impl<T: Send> Send for Buffer<T> {}
unsafe impl<T: Sync> Sync for Buffer<T> {}

impl<T> Buffer<T> {
    pub fn with_capacity(cap: usize) -> Self {
        if mem::size_of::<T>() == 0 {
            return Buffer {
                ptr: NonNull::dangling(),
                cap: usize::MAX,
            };
        }

        if cap == 0 {
            return Buffer {
                ptr: NonNull::dangling(),
                cap: 0,
            };
        }

        let layout = array_layout::<T>(cap);
        let ptr = unsafe { alloc::alloc(layout) };

        let ptr = match NonNull::new(ptr as *mut T) {
            Some(p) => p,
            None => alloc::handle_alloc_error(layout),
        };

        Buffer { ptr, cap }
    }
}

impl<T> Drop for Buffer<T> {
    fn drop(&mut self) {
        let elem_size = mem::size_of::<T>();

        if self.cap != 0 && elem_size != 0 {
            unsafe {
                alloc::dealloc(self.ptr.as_ptr() as *mut u8, array_layout::<T>(self.cap));
            }
        }
    }
}

fn array_layout<T>(cap: usize) -> Layout {
    match Layout::array::<T>(cap) {
        Ok(layout) => layout,
        Err(_) => panic!("capacity overflow"),
    }
}

#[cfg(test)]
mod tests {
    use super::Buffer;

    #[test]
    fn with_capacity() {
        let buf: Buffer<u64> = Buffer::with_capacity(7);

        assert_eq!(buf.cap, 7);
    }

    #[test]
    fn with_zero_capacity() {
        let buf: Buffer<u64> = Buffer::with_capacity(0);

        assert_eq!(buf.cap, 0);
    }

    #[test]
    fn with_capacity_zst() {
        let buf: Buffer<()> = Buffer::with_capacity(7);

        assert_eq!(buf.cap, usize::MAX);
    }
}
