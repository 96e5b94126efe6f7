/// Magic prefix of an uncompressed IR file.
pub const IR_MAGIC: &[u8; 5] = b"HYIR\0";

/// Magic prefix of a zstd-compressed IR file.
pub const IR_MAGIC_ZSTD: &[u8; 5] = b"HYIRZ";

/// Version (major, minor, patch) of the IR file format written by this crate.
///
/// Readers accept any file with the same major version.
pub const IR_FORMAT_VERSION: (u16, u16, u16) = (1, 0, 0);

/// Compression level used when none is configured.
pub const DEFAULT_ZSTD_LEVEL: i32 = 3;

/// Name of the environment variable containing the path to the IR configuration file.
/// If not set, defaults to
///  (1) on Linux and macOS: `$XDG_CONFIG_HOME/hyperion/hyir.toml` or `$HOME/.config/hyperion/hyir.toml`
///  (2) on Windows: `%APPDATA%\hyperion\hyir.toml`
pub const ENV_IR_CONFIG_PATH: &str = "HYIR_CONFIG_PATH";
