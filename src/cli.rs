//! Command-line surface shared by both tools, plus the `stdin`-only
//! extension. Built with `clap`'s derive API; the shared struct is flattened
//! into each binary's own struct so the two tools cannot drift apart on the
//! options they have in common.

use std::path::PathBuf;

use clap::Parser;

use crate::error::ConfigError;
use crate::format::{Endian, SampleFormat, SampleKind};

/// Options common to `jack-stdin` and `jack-stdout`.
#[derive(Parser, Debug)]
pub struct CommonArgs {
    /// Suppress the startup banner and raise the default log level to errors only.
    #[arg(short, long)]
    pub quiet: bool,

    /// Bits per sample: 8, 16, 24, or 32.
    #[arg(short, long, default_value = "16")]
    pub bitdepth: String,

    /// Duration in seconds; 0 means unlimited.
    #[arg(short, long, default_value_t = 0.0)]
    pub duration: f64,

    /// Sample encoding; accepts any unambiguous prefix of the full name.
    #[arg(short, long, default_value = "signed-integer")]
    pub encoding: String,

    /// Use little-endian byte order (default).
    #[arg(short = 'L', long, conflicts_with = "big_endian")]
    pub little_endian: bool,

    /// Use big-endian byte order.
    #[arg(short = 'B', long)]
    pub big_endian: bool,

    /// Ring buffer size, in samples per channel.
    #[arg(short = 'S', long, default_value_t = 65536)]
    pub bufsize: u32,

    /// Destination/source ports to connect to; the channel count is the
    /// number of ports given.
    #[arg(required = true)]
    pub ports: Vec<String>,
}

/// `jack-stdin`'s additional options.
#[derive(Parser, Debug)]
pub struct StdinArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Read PCM from this file instead of stdin.
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Pre-buffer fill threshold, as a percentage of the ring's capacity.
    #[arg(short, long, default_value_t = 25.0)]
    pub prebuffer: f64,
}

/// `jack-stdout` takes only the common surface.
#[derive(Parser, Debug)]
pub struct StdoutArgs {
    #[command(flatten)]
    pub common: CommonArgs,
}

impl CommonArgs {
    pub fn endian(&self) -> Endian {
        if self.big_endian { Endian::Big } else { Endian::Little }
    }

    pub fn sample_format(&self) -> Result<SampleFormat, ConfigError> {
        let width: u8 = self.bitdepth.parse().map_err(|_| ConfigError::InvalidOption {
            option: "bitdepth",
            detail: self.bitdepth.clone(),
        })?;

        let kind = SampleKind::from_prefix(&self.encoding).ok_or_else(|| ConfigError::InvalidOption {
            option: "encoding",
            detail: self.encoding.clone(),
        })?;

        SampleFormat::new(width, kind, self.endian()).ok_or_else(|| ConfigError::InvalidOption {
            option: "bitdepth",
            detail: format!("{width}-bit is not valid for {kind}"),
        })
    }

    pub fn channels(&self) -> Result<usize, ConfigError> {
        if self.ports.is_empty() {
            Err(ConfigError::NoPorts)
        } else {
            Ok(self.ports.len())
        }
    }
}

impl StdinArgs {
    /// Clamp the pre-buffer percent per the documented rule: values under 1
    /// round to 0, values over 90 clamp to 90 (matching the reference's own
    /// `atof` + clamp, not a rejection).
    pub fn prebuffer_percent(&self) -> f64 {
        if self.prebuffer < 1.0 {
            0.0
        } else if self.prebuffer > 90.0 {
            90.0
        } else {
            self.prebuffer
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prebuffer_below_one_rounds_to_zero() {
        let args = StdinArgs::parse_from(["jack-stdin", "-p", "0.5", "port1"]);
        assert_eq!(args.prebuffer_percent(), 0.0);
    }

    #[test]
    fn prebuffer_above_ninety_clamps_to_ninety() {
        let args = StdinArgs::parse_from(["jack-stdin", "-p", "95", "port1"]);
        assert_eq!(args.prebuffer_percent(), 90.0);
    }

    #[test]
    fn encoding_prefix_resolves_through_sample_format() {
        let args = CommonArgs::parse_from(["jack-stdout", "-e", "u", "port1", "port2"]);
        let format = args.sample_format().unwrap();
        assert_eq!(format.kind, SampleKind::UnsignedInt);
    }

    #[test]
    fn channel_count_follows_positional_port_count() {
        let args = CommonArgs::parse_from(["jack-stdout", "port1", "port2", "port3"]);
        assert_eq!(args.channels().unwrap(), 3);
    }
}
