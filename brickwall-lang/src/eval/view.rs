//! Defines the views that templates read values from.

use std::io;

use brickwall_common::Input;

/// A view describes the bytes a template is executed against.
#[derive(Debug, Clone, Copy)]
pub enum View<'src> {
    /// Reads from an opened input.
    Input(&'src Input),
    /// Reads directly from the underlying bytes.
    Bytes(&'src [u8]),
}

impl View<'_> {
    /// Returns the length of the view in bytes.
    pub fn len(&self) -> u64 {
        match self {
            View::Input(input) => input.len(),
            View::Bytes(bytes) => {
                u64::try_from(bytes.len()).expect("length of in memory array fits into `u64`")
            }
        }
    }

    /// Returns `true` if the view is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reads data into the buffer at the given offset.
    ///
    /// The returned slice is shorter than `buf` if the view ends first.
    pub(crate) fn read_at<'buf>(&self, offset: u64, buf: &'buf mut [u8]) -> io::Result<&'buf [u8]> {
        match self {
            View::Input(input) => input.read_at(offset, buf),
            View::Bytes(bytes) => {
                let start = usize::try_from(offset)
                    .ok()
                    .filter(|&start| start <= bytes.len())
                    .ok_or_else(|| io::Error::other("offset is beyond input"))?;
                let output_size = std::cmp::min(bytes.len() - start, buf.len());

                buf[..output_size].copy_from_slice(&bytes[start..start + output_size]);

                Ok(&buf[..output_size])
            }
        }
    }
}

impl<'src> From<&'src [u8]> for View<'src> {
    fn from(bytes: &'src [u8]) -> Self {
        View::Bytes(bytes)
    }
}

impl<'src> From<&'src Input> for View<'src> {
    fn from(input: &'src Input) -> Self {
        View::Input(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_views_truncate_reads() {
        let data = [1, 2, 3, 4, 5];
        let input = Input::from_bytes(data.to_vec());

        for view in [View::from(&data[..]), View::from(&input)] {
            let mut buf = [0; 4];
            assert_eq!(view.len(), 5);
            assert_eq!(view.read_at(1, &mut buf).unwrap(), &[2, 3, 4, 5]);
            assert_eq!(view.read_at(3, &mut buf).unwrap(), &[4, 5]);
            assert!(view.read_at(6, &mut buf).is_err());
        }
    }
}
