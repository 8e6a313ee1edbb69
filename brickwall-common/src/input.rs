//! Models how the subject buffer of a document is accessed.

use std::{io, path::PathBuf, sync::Arc};

use positioned_io::{RandomAccessFile, ReadAt as _, Size as _};

/// The bytes that bricks are placed over.
#[derive(Debug, Clone)]
pub struct Input(Arc<InputType>);

/// The different sources of input.
#[derive(Debug)]
enum InputType {
    /// The input is the given file.
    File {
        /// The open file handle.
        file: RandomAccessFile,
        /// The length of the file in bytes.
        len: u64,
    },
    /// The input is held in memory, for example after reading stdin.
    Memory(Box<[u8]>),
}

impl Input {
    /// Creates an input from the given path.
    pub fn from_path(path: impl Into<PathBuf>) -> io::Result<Input> {
        let path = path.into();

        let file = RandomAccessFile::open(&path)?;
        let len = file
            .size()?
            .ok_or_else(|| io::Error::other("cannot get file size"))?;

        Ok(Input(Arc::new(InputType::File { file, len })))
    }

    /// Creates an input from stdin.
    ///
    /// This should only be called once since it consumes stdin.
    pub fn from_stdin() -> io::Result<Input> {
        let mut buf = Vec::new();
        io::Read::read_to_end(&mut io::stdin(), &mut buf)?;

        Ok(Input::from_bytes(buf))
    }

    /// Creates an input from bytes that are already in memory.
    pub fn from_bytes(bytes: impl Into<Box<[u8]>>) -> Input {
        Input(Arc::new(InputType::Memory(bytes.into())))
    }

    /// The length of the data.
    pub fn len(&self) -> u64 {
        match &*self.0 {
            InputType::File { len, .. } => *len,
            InputType::Memory(bytes) => {
                u64::try_from(bytes.len()).expect("length of in memory data fits into `u64`")
            }
        }
    }

    /// Determines if the input is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fills the buffer with the data at the given offset, returning the filled slice.
    ///
    /// The returned slice is shorter than `buf` if the input ends first.
    pub fn read_at<'buf>(&self, offset: u64, buf: &'buf mut [u8]) -> io::Result<&'buf [u8]> {
        let len = self.len();
        if offset > len {
            return Err(io::Error::other("offset is beyond input"));
        }

        let len_left = len - offset;
        let output_size = std::cmp::min(len_left, u64::try_from(buf.len()).unwrap_or(u64::MAX));
        let truncated_buf = &mut buf[..usize::try_from(output_size)
            .expect("we used min above, so this must fit into `buf`")];

        match &*self.0 {
            InputType::File { file, .. } => file.read_exact_at(offset, truncated_buf)?,
            InputType::Memory(bytes) => {
                let start = usize::try_from(offset)
                    .map_err(|_| io::Error::other("offset does not fit into `usize`"))?;
                truncated_buf.copy_from_slice(&bytes[start..start + truncated_buf.len()]);
            }
        }

        Ok(truncated_buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_are_truncated_at_the_end() {
        let input = Input::from_bytes(vec![1, 2, 3, 4, 5]);
        let mut buf = [0; 4];

        assert_eq!(input.read_at(0, &mut buf).unwrap(), &[1, 2, 3, 4]);
        assert_eq!(input.read_at(3, &mut buf).unwrap(), &[4, 5]);
        assert_eq!(input.read_at(5, &mut buf).unwrap(), &[] as &[u8]);
        assert!(input.read_at(6, &mut buf).is_err());
    }
}
