//! CSV dumps of parsed channels.

use std::{
    format,
    fs::File,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
    string::{String, ToString},
    vec::Vec,
};

use crate::{channel::Channel, snapshot::SensorSnapshot};

impl Channel {
    /// Writes a short description block, then one row per tuple: flat index
    /// followed by every element. Primitive elements are written in their
    /// stored type, non-primitive ones as big-endian hex.
    pub fn save_as_csv<P: AsRef<Path>>(&self, file: P) -> std::io::Result<()> {
        let mut file = BufWriter::new(File::create(file)?);

        writeln!(file, "Channel;{}", self.name())?;
        writeln!(file, "Frequency;{};Hz", self.frequency_hz())?;
        let dims = self
            .dimensions()
            .iter()
            .map(|d| d.to_string())
            .collect::<Vec<_>>()
            .join("x");
        writeln!(file, "Tuples;{};Dimensions;{}", self.num_tuples(), dims)?;

        write!(file, "Index")?;
        for (i, meta) in self.element_metadata().iter().enumerate() {
            write!(file, ";e{} ({})", i, meta.promoted_type)?;
        }
        writeln!(file)?;

        for (index, tuple) in self.tuples().enumerate() {
            write!(file, "{}", index)?;
            for e in 0..tuple.len() {
                match tuple.value(e) {
                    Some(v) => write!(file, ";{}", v)?,
                    None => {
                        write!(file, ";0x")?;
                        for b in tuple.element_bytes(e).unwrap_or_default() {
                            write!(file, "{:02X}", b)?;
                        }
                    }
                }
            }
            writeln!(file)?;
        }

        file.flush()
    }
}

impl SensorSnapshot {
    /// Saves every channel as `<timestamp>-<name>.csv` under `dir`, returning
    /// the files written.
    pub fn save_as_csv<P: AsRef<Path>>(&self, dir: P) -> std::io::Result<Vec<PathBuf>> {
        self.channels()
            .map(|channel| -> std::io::Result<PathBuf> {
                let path = dir.as_ref().join(format!(
                    "{}-{}.csv",
                    self.timestamp_ms(),
                    file_stem(channel.name())
                ));
                channel.save_as_csv(&path)?;
                Ok(path)
            })
            .collect()
    }
}

fn file_stem(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_alphanumeric() || c == '-' { c } else { '_' })
        .collect()
}
