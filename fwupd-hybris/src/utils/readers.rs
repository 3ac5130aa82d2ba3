use std::fs::File;
use std::io::{self, BufRead, BufReader, Lines, Read};
use std::path::{Path, PathBuf};

/// Line iterator over `build.prop` style sources that skips `#` comment
/// lines but reports I/O errors to the caller.
pub struct PropLines<R: Read> {
    lines: Lines<BufReader<R>>,
}

macro_rules! try_from {
    ($src:ty) => {
        impl TryFrom<$src> for PropLines<File> {
            type Error = io::Error;

            fn try_from(path: $src) -> Result<Self, Self::Error> {
                let f = File::open(path)?;
                Ok(Self::new(f))
            }
        }
    };
}

try_from!(&Path);
try_from!(PathBuf);
try_from!(&PathBuf);

impl<R: Read> PropLines<R> {
    pub fn new(wrapped: R) -> Self {
        Self {
            lines: BufReader::new(wrapped).lines(),
        }
    }
}

impl<R: Read> Iterator for PropLines<R> {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.lines.next() {
                None => return None,
                Some(Err(e)) => return Some(Err(e)),
                Some(Ok(l)) => {
                    if l.trim_start().starts_with('#') {
                        continue;
                    }
                    return Some(Ok(l));
                }
            }
        }
    }
}

#[cfg(test)]
mod test {
    use crate::utils::PropLines;

    #[test]
    fn test_prop_lines() {
        let content = r#"# begin build properties
ro.product.vendor.name=widget
   # autogenerated
ro.bootloader=abl
persist.sys.usb#config=mtp"#;

        let mut bytes = content.as_bytes();
        let lines = PropLines::new(&mut bytes)
            .map(|it| it.expect("no errors"))
            .collect::<Vec<String>>();
        assert_eq!(
            lines.as_slice(),
            &[
                "ro.product.vendor.name=widget",
                "ro.bootloader=abl",
                "persist.sys.usb#config=mtp"
            ]
        )
    }
}
