//! IR file format.
//!
//! ```text
//! magic      5 bytes   IR_MAGIC or IR_MAGIC_ZSTD
//! version    3 x u16   major, minor, patch (little-endian)
//! payload    ...       borsh-encoded IrRecord, zstd-compressed under IR_MAGIC_ZSTD
//! ```
//!
//! Aux data is stored as its raw triples and is never decoded while loading,
//! so entries of unknown schemas survive a load/save cycle unchanged.
use std::{
    fs::File,
    io::{BufReader, BufWriter, Read, Write},
    path::Path,
};

use borsh::{BorshDeserialize, BorshSerialize};
use hyaux::{AuxDataContainer, RawAuxData};
use log::{debug, info, warn};
use semver::{Comparator, Op, Prerelease, Version, VersionReq};
use uuid::Uuid;

use crate::{
    context::Context,
    error::{IrError, IrResult},
    ir::{Ir, Module},
    magic::{IR_FORMAT_VERSION, IR_MAGIC, IR_MAGIC_ZSTD},
};

#[derive(BorshSerialize, BorshDeserialize)]
struct ModuleRecord {
    uuid: Uuid,
    name: String,
    aux_data: Vec<RawAuxData>,
}

#[derive(BorshSerialize, BorshDeserialize)]
struct IrRecord {
    uuid: Uuid,
    aux_data: Vec<RawAuxData>,
    modules: Vec<ModuleRecord>,
}

/// Version of the format written by [`Ir::save`].
pub fn format_version() -> Version {
    let (major, minor, patch) = IR_FORMAT_VERSION;
    Version::new(major as u64, minor as u64, patch as u64)
}

/// Versions accepted by [`Ir::load`]: same major version as [`format_version`].
pub fn format_requirement() -> VersionReq {
    VersionReq {
        comparators: vec![Comparator {
            op: Op::Caret,
            major: IR_FORMAT_VERSION.0 as u64,
            minor: None,
            patch: None,
            pre: Prerelease::EMPTY,
        }],
    }
}

fn lock_registry(ctx: &Context) {
    if ctx.registry().options().lock_on_serialize && !ctx.registry().is_locked() {
        debug!("Locking the aux data schema registry before (de)serialization");
        ctx.registry().lock();
    }
}

fn write_header<W: Write>(writer: &mut W, compressed: bool) -> IrResult<()> {
    writer.write_all(if compressed { IR_MAGIC_ZSTD } else { IR_MAGIC })?;
    let (major, minor, patch) = IR_FORMAT_VERSION;
    for part in [major, minor, patch] {
        writer.write_all(&part.to_le_bytes())?;
    }
    Ok(())
}

/// Read and check the header. Returns whether the payload is compressed.
fn read_header<R: Read>(reader: &mut R) -> IrResult<bool> {
    let mut magic = [0u8; 5];
    reader.read_exact(&mut magic)?;

    let compressed = match &magic {
        m if m == IR_MAGIC => false,
        m if m == IR_MAGIC_ZSTD => true,
        _ => {
            return Err(IrError::BadMagic {
                found: magic.to_vec(),
            });
        }
    };

    let mut parts = [0u16; 3];
    for part in parts.iter_mut() {
        let mut bytes = [0u8; 2];
        reader.read_exact(&mut bytes)?;
        *part = u16::from_le_bytes(bytes);
    }

    let found = Version::new(parts[0] as u64, parts[1] as u64, parts[2] as u64);
    let required = format_requirement();
    if !required.matches(&found) {
        return Err(IrError::IncompatibleVersion { found, required });
    }

    Ok(compressed)
}

impl From<&Module> for ModuleRecord {
    fn from(module: &Module) -> Self {
        Self {
            uuid: module.uuid,
            name: module.name.clone(),
            aux_data: module.aux_data.to_raw_entries(),
        }
    }
}

impl From<ModuleRecord> for Module {
    fn from(record: ModuleRecord) -> Self {
        Self {
            uuid: record.uuid,
            name: record.name,
            aux_data: AuxDataContainer::from_raw_entries(record.aux_data),
        }
    }
}

impl Ir {
    /// Write this IR to `writer`.
    ///
    /// Locks the registry of `ctx` if its options ask for it. The payload is
    /// compressed unless disabled by configuration or the `legacy_nozstd` feature.
    pub fn save<W: Write>(&self, ctx: &Context, mut writer: W) -> IrResult<()> {
        lock_registry(ctx);

        let record = IrRecord {
            uuid: self.uuid,
            aux_data: self.aux_data.to_raw_entries(),
            modules: self.modules.iter().map(ModuleRecord::from).collect(),
        };
        let payload = borsh::to_vec(&record).map_err(IrError::Encoding)?;

        let compressed = ctx.config().compression_enabled();
        write_header(&mut writer, compressed)?;
        if compressed {
            let packed = zstd::encode_all(payload.as_slice(), ctx.config().io.level)?;
            debug!(
                "Compressed IR payload from {} to {} bytes",
                payload.len(),
                packed.len()
            );
            writer.write_all(&packed)?;
        } else {
            writer.write_all(&payload)?;
        }
        writer.flush()?;

        info!(
            "Saved IR {} ({} aux data entries, {} modules)",
            self.uuid,
            record.aux_data.len(),
            record.modules.len()
        );
        Ok(())
    }

    /// Read an IR written by [`Self::save`].
    ///
    /// The registry of `ctx` is locked once the header is accepted, so a
    /// rejected file leaves it untouched. Aux data is kept as raw bytes until
    /// a typed accessor asks for it.
    pub fn load<R: Read>(ctx: &Context, mut reader: R) -> IrResult<Self> {
        let compressed = read_header(&mut reader)?;
        lock_registry(ctx);

        let mut payload = Vec::new();
        reader.read_to_end(&mut payload)?;
        if compressed {
            payload = zstd::decode_all(payload.as_slice()).map_err(IrError::Encoding)?;
        }

        let record: IrRecord = borsh::from_slice(&payload).map_err(IrError::Encoding)?;
        let ir = Ir {
            uuid: record.uuid,
            aux_data: AuxDataContainer::from_raw_entries(record.aux_data),
            modules: record.modules.into_iter().map(Module::from).collect(),
        };

        let unknown = std::iter::once(&ir.aux_data)
            .chain(ir.modules.iter().map(|module| &module.aux_data))
            .flat_map(|container| container.iter())
            .filter(|raw| ctx.registry().lookup_by_name(&raw.key).is_none())
            .count();
        if unknown > 0 {
            warn!(
                "IR {} holds {} aux data entries of unregistered schemas; they are kept as raw bytes",
                ir.uuid, unknown
            );
        }

        info!(
            "Loaded IR {} ({} aux data entries, {} modules)",
            ir.uuid,
            ir.aux_data.len(),
            ir.modules.len()
        );
        Ok(ir)
    }

    /// [`Self::save`] to a file, creating or truncating it.
    pub fn save_to_path(&self, ctx: &Context, path: &Path) -> IrResult<()> {
        self.save(ctx, BufWriter::new(File::create(path)?))
    }

    /// [`Self::load`] from a file.
    pub fn load_from_path(ctx: &Context, path: &Path) -> IrResult<Self> {
        Self::load(ctx, BufReader::new(File::open(path)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_round_trip() {
        for compressed in [false, true] {
            let mut buf = Vec::new();
            write_header(&mut buf, compressed).unwrap();
            assert_eq!(buf.len(), 11);
            assert_eq!(read_header(&mut buf.as_slice()).unwrap(), compressed);
        }
    }

    #[test]
    fn requirement_accepts_same_major_only() {
        let required = format_requirement();
        assert!(required.matches(&format_version()));
        assert!(required.matches(&Version::new(1, 7, 2)));
        assert!(!required.matches(&Version::new(2, 0, 0)));
        assert!(!required.matches(&Version::new(0, 9, 0)));
    }

    #[test]
    fn incompatible_major_is_rejected() {
        let mut buf = IR_MAGIC.to_vec();
        for part in [2u16, 0, 0] {
            buf.extend_from_slice(&part.to_le_bytes());
        }

        match read_header(&mut buf.as_slice()) {
            Err(IrError::IncompatibleVersion { found, .. }) => {
                assert_eq!(found, Version::new(2, 0, 0))
            }
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn unknown_magic_is_rejected() {
        let buf = b"\x7fELF\x02\x00\x00\x00\x00\x00";
        match read_header(&mut buf.as_slice()) {
            Err(IrError::BadMagic { found }) => assert_eq!(found, b"\x7fELF\x02"),
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn truncated_header_is_an_io_error() {
        assert!(read_header(&mut &IR_MAGIC[..3]).unwrap_err().is_io());
    }
}
