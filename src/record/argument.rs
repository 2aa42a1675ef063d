use crate::codec::{patch_u32, PutLe};

pub(crate) mod tag {
    pub const BOOL: u8 = 1;
    pub const CHAR: u8 = 2;
    pub const I8: u8 = 3;
    pub const U8: u8 = 4;
    pub const I16: u8 = 5;
    pub const U16: u8 = 6;
    pub const I32: u8 = 7;
    pub const U32: u8 = 8;
    pub const I64: u8 = 9;
    pub const U64: u8 = 10;
    pub const F32: u8 = 11;
    pub const F64: u8 = 12;
    pub const STRING: u8 = 13;
    pub const POINTER: u8 = 14;
    pub const NAMED: u8 = 15;
    pub const CUSTOM: u8 = 16;
    pub const LIST: u8 = 17;
}

/// A value that can be stored in a record buffer and formatted later.
///
/// Implement this for your own types with [`store_custom`] or
/// [`ListWriter`]:
///
/// ```
/// use lumber::{store_custom, Argument};
///
/// struct Date(i32, u32, u32);
///
/// impl Argument for Date {
///     fn store(&self, buffer: &mut Vec<u8>) {
///         store_custom(buffer, "{}-{}-{}", &[&self.0, &self.1, &self.2]);
///     }
/// }
/// ```
pub trait Argument {
    fn store(&self, buffer: &mut Vec<u8>);
}

impl<T: Argument + ?Sized> Argument for &T {
    fn store(&self, buffer: &mut Vec<u8>) {
        (**self).store(buffer)
    }
}

macro_rules! impl_fixed_argument {
    ($($ty:ty => $tag:expr),* $(,)?) => {
        $(
            impl Argument for $ty {
                fn store(&self, buffer: &mut Vec<u8>) {
                    buffer.put_u8($tag);
                    buffer.extend_from_slice(&self.to_le_bytes());
                }
            }
        )*
    };
}

impl_fixed_argument! {
    i8 => tag::I8,
    u8 => tag::U8,
    i16 => tag::I16,
    u16 => tag::U16,
    i32 => tag::I32,
    u32 => tag::U32,
    i64 => tag::I64,
    u64 => tag::U64,
    f32 => tag::F32,
    f64 => tag::F64,
}

impl Argument for isize {
    fn store(&self, buffer: &mut Vec<u8>) {
        (*self as i64).store(buffer)
    }
}

impl Argument for usize {
    fn store(&self, buffer: &mut Vec<u8>) {
        (*self as u64).store(buffer)
    }
}

impl Argument for bool {
    fn store(&self, buffer: &mut Vec<u8>) {
        buffer.put_u8(tag::BOOL);
        buffer.put_u8(u8::from(*self));
    }
}

impl Argument for char {
    fn store(&self, buffer: &mut Vec<u8>) {
        buffer.put_u8(tag::CHAR);
        buffer.put_u32(u32::from(*self));
    }
}

impl Argument for str {
    fn store(&self, buffer: &mut Vec<u8>) {
        buffer.put_u8(tag::STRING);
        buffer.put_u32(self.len() as u32);
        buffer.extend_from_slice(self.as_bytes());
    }
}

impl Argument for String {
    fn store(&self, buffer: &mut Vec<u8>) {
        self.as_str().store(buffer)
    }
}

impl<T> Argument for *const T {
    fn store(&self, buffer: &mut Vec<u8>) {
        buffer.put_u8(tag::POINTER);
        buffer.put_u64(*self as usize as u64);
    }
}

impl<T> Argument for *mut T {
    fn store(&self, buffer: &mut Vec<u8>) {
        (*self as *const T).store(buffer)
    }
}

/// Argument addressable by name from a pattern (`{name}`).
pub struct NamedArg<'a> {
    name: &'a str,
    value: &'a dyn Argument,
}

/// Binds `value` to `name` so a pattern can refer to it as `{name}`.
pub fn named<'a>(name: &'a str, value: &'a dyn Argument) -> NamedArg<'a> {
    NamedArg { name, value }
}

impl Argument for NamedArg<'_> {
    fn store(&self, buffer: &mut Vec<u8>) {
        buffer.put_u8(tag::NAMED);
        buffer.put_u32(self.name.len() as u32);
        buffer.extend_from_slice(self.name.as_bytes());
        self.value.store(buffer);
    }
}

/// Serializes all `args` one after another.
pub fn store_arguments(buffer: &mut Vec<u8>, args: &[&dyn Argument]) {
    for arg in args {
        arg.store(buffer);
    }
}

/// Stores a nested format pattern with its own arguments. It renders as the
/// formatted sub-pattern.
pub fn store_custom(buffer: &mut Vec<u8>, pattern: &str, args: &[&dyn Argument]) {
    buffer.put_u8(tag::CUSTOM);
    let begin = buffer.len();
    buffer.put_u32(0);
    buffer.put_u32(pattern.len() as u32);
    buffer.extend_from_slice(pattern.as_bytes());
    store_arguments(buffer, args);
    let total = (buffer.len() - begin) as u32;
    patch_u32(buffer, begin, total);
}

/// Stores a list of values that render back to back. The list length is
/// patched in when the writer is dropped.
pub struct ListWriter<'a> {
    buffer: &'a mut Vec<u8>,
    begin: usize,
}

impl<'a> ListWriter<'a> {
    pub fn new(buffer: &'a mut Vec<u8>) -> Self {
        buffer.put_u8(tag::LIST);
        let begin = buffer.len();
        buffer.put_u32(0);
        Self { buffer, begin }
    }

    pub fn push(&mut self, value: &dyn Argument) -> &mut Self {
        value.store(self.buffer);
        self
    }
}

impl Drop for ListWriter<'_> {
    fn drop(&mut self) {
        let total = (self.buffer.len() - self.begin) as u32;
        patch_u32(self.buffer, self.begin, total);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_layout() {
        let mut buffer = Vec::new();
        42i32.store(&mut buffer);
        assert_eq!(buffer, [tag::I32, 42, 0, 0, 0]);

        buffer.clear();
        true.store(&mut buffer);
        assert_eq!(buffer, [tag::BOOL, 1]);

        buffer.clear();
        "ab".store(&mut buffer);
        assert_eq!(buffer, [tag::STRING, 2, 0, 0, 0, b'a', b'b']);
    }

    #[test]
    fn test_named_layout() {
        let mut buffer = Vec::new();
        named("n", &7u8).store(&mut buffer);
        assert_eq!(buffer, [tag::NAMED, 1, 0, 0, 0, b'n', tag::U8, 7]);
    }

    #[test]
    fn test_custom_size_includes_prefix() {
        let mut buffer = Vec::new();
        store_custom(&mut buffer, "{}", &[&1u8]);
        // tag + u32 total + u32 pattern len + "{}" + (tag + u8)
        assert_eq!(buffer.len(), 1 + 4 + 4 + 2 + 2);
        assert_eq!(buffer[1], 12);
    }

    #[test]
    fn test_list_writer_patches_on_drop() {
        let mut buffer = Vec::new();
        {
            let mut list = ListWriter::new(&mut buffer);
            list.push(&'a').push(&1u8);
        }
        assert_eq!(buffer[0], tag::LIST);
        // u32 total + (tag + u32) + (tag + u8)
        assert_eq!(buffer[1], 4 + 5 + 2);
    }
}
