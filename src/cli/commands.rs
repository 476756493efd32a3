use anyhow::{Context, Result, bail};
use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;

use crate::cli::global::GlobalArgs;

/// Reads the whole input, honouring `--max-size` and `--force`.
pub fn read_input(file: Option<&PathBuf>, global: &GlobalArgs) -> Result<Vec<u8>> {
    let Some(file_path) = file else {
        let mut buffer = Vec::new();
        io::stdin()
            .read_to_end(&mut buffer)
            .context("reading stdin")?;

        if global.max_size > 0 && buffer.len() > global.max_size {
            bail!(
                "Input size ({} bytes) exceeds maximum ({} bytes). Use a file with --force for large inputs.",
                buffer.len(),
                global.max_size
            );
        }
        return Ok(buffer);
    };

    if global.max_size > 0 {
        let metadata = fs::metadata(file_path)
            .with_context(|| format!("reading {}", file_path.display()))?;
        let file_size = metadata.len() as usize;

        if file_size > global.max_size {
            if !global.force {
                bail!(
                    "File size ({} bytes) exceeds limit ({} bytes). Use --force to process anyway.",
                    file_size,
                    global.max_size
                );
            }
            tracing::warn!(file_size, limit = global.max_size, "processing large file");
        }
    }

    fs::read(file_path)
        .with_context(|| format!("reading {}", file_path.display()))
}

/// Writes to `output`, or stdout when absent.
pub fn write_output(output: Option<&PathBuf>, data: &[u8]) -> Result<()> {
    match output {
        Some(path) => fs::write(path, data)
            .with_context(|| format!("writing {}", path.display())),
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(data).context("writing stdout")?;
            stdout.flush().context("writing stdout")
        }
    }
}

/// Breaks `encoded` into lines of `width` characters, each ending in `\n`.
/// A width of 0 yields a single line.
pub fn wrap_lines(encoded: &[u8], width: usize) -> Vec<u8> {
    if encoded.is_empty() {
        return Vec::new();
    }
    if width == 0 {
        let mut out = Vec::with_capacity(encoded.len() + 1);
        out.extend_from_slice(encoded);
        out.push(b'\n');
        return out;
    }

    let mut out = Vec::with_capacity(encoded.len() + encoded.len() / width + 1);
    for line in encoded.chunks(width) {
        out.extend_from_slice(line);
        out.push(b'\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_lines() {
        assert_eq!(wrap_lines(b"", 4), b"");
        assert_eq!(wrap_lines(b"TWFu", 0), b"TWFu\n");
        assert_eq!(wrap_lines(b"TWFuTWE=", 4), b"TWFu\nTWE=\n");
        assert_eq!(wrap_lines(b"TWFuTWE=", 5), b"TWFuT\nWE=\n");
    }
}
