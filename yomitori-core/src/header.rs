use crate::error::{ElfError, Result};
use byteorder::{BigEndian, ByteOrder, LittleEndian, ReadBytesExt};
use std::io::{self, Cursor, Read};

/// The four magic bytes opening every ELF image: `0x7F 'E' 'L' 'F'`.
pub const ELF_MAGIC: [u8; 4] = [0x7f, b'E', b'L', b'F'];

/// The only ELF version this crate understands (`EV_CURRENT`).
pub const EV_CURRENT: u8 = 1;

/// Word width of the image: whether offsets and addresses are stored as
/// 32-bit or 64-bit fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Class {
    Elf32 = 1,
    Elf64 = 2,
}

impl Class {
    pub(crate) fn from_u8(v: u8) -> Option<Class> {
        match v {
            1 => Some(Class::Elf32),
            2 => Some(Class::Elf64),
            _ => None,
        }
    }

    /// Size in bytes of the full file header under this word width.
    pub fn ehdr_size(self) -> usize {
        match self {
            Class::Elf32 => 52,
            Class::Elf64 => 64,
        }
    }
}

/// Byte order of every multi-byte integer field in the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Data {
    /// Little-endian (`ELFDATA2LSB`).
    Lsb = 1,
    /// Big-endian (`ELFDATA2MSB`).
    Msb = 2,
}

impl Data {
    pub(crate) fn from_u8(v: u8) -> Option<Data> {
        match v {
            1 => Some(Data::Lsb),
            2 => Some(Data::Msb),
            _ => None,
        }
    }
}

/// Canonical ELF file header: every field widened to 64 bits and stored in
/// host byte order, whichever of the four physical layouts encoded it.
///
/// Field names follow the standard `Elf64_Ehdr` from the ELF specification.
///
/// Reference: [ELF Specification v1.2](https://refspecs.linuxfoundation.org/elf/elf.pdf)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ehdr {
    /// Word width declared by `e_ident[EI_CLASS]`.
    pub class: Class,

    /// Byte order declared by `e_ident[EI_DATA]`.
    pub data: Data,

    /// Ident version byte (`e_ident[EI_VERSION]`, always 1).
    pub ei_version: u8,

    /// OS/ABI identification (`e_ident[EI_OSABI]`).
    pub os_abi: u8,

    /// ABI version (`e_ident[EI_ABIVERSION]`).
    pub abi_version: u8,

    /// Object file type (relocatable, executable, shared, core).
    pub e_type: u16,

    /// Target architecture, e.g. `EM_X86_64` (62) or `EM_AARCH64` (183).
    pub e_machine: u16,

    /// ELF version, must equal `EV_CURRENT` = 1.
    pub e_version: u32,

    /// Virtual address of the program entry point.
    pub e_entry: u64,

    /// File offset of the program header table.
    pub e_phoff: u64,

    /// File offset of the section header table.
    pub e_shoff: u64,

    /// Processor-specific flags.
    pub e_flags: u32,

    /// Size of this header in the file (52 for ELF32, 64 for ELF64).
    pub e_ehsize: u16,

    /// Size of one program header table entry.
    pub e_phentsize: u16,

    /// Number of program header table entries.
    pub e_phnum: u16,

    /// Size of one section header table entry.
    pub e_shentsize: u16,

    /// Number of section header table entries.
    pub e_shnum: u16,

    /// Index of the section holding section names.
    pub e_shstrndx: u16,
}

impl Ehdr {
    /// Decodes the raw header bytes laid out under `(class, data)` into the
    /// canonical native form.
    ///
    /// The four physical layouts are handled by four independent routines;
    /// no pair shares control flow with another.
    pub(crate) fn canonicalize(buf: &[u8], class: Class, data: Data) -> Result<Ehdr> {
        let mut cur = Cursor::new(buf);
        match (class, data) {
            (Class::Elf32, Data::Lsb) => Self::read32::<LittleEndian>(&mut cur),
            (Class::Elf32, Data::Msb) => Self::read32::<BigEndian>(&mut cur),
            (Class::Elf64, Data::Lsb) => Self::read64::<LittleEndian>(&mut cur),
            (Class::Elf64, Data::Msb) => Self::read64::<BigEndian>(&mut cur),
        }
    }

    fn read_ident<R: Read>(cur: &mut R) -> Result<[u8; 16]> {
        let mut e_ident = [0u8; 16];
        cur.read_exact(&mut e_ident)?;
        Ok(e_ident)
    }

    fn from_ident(e_ident: [u8; 16]) -> Result<Ehdr> {
        let class = Class::from_u8(e_ident[4])
            .ok_or_else(|| ElfError::format("bad ELF class"))?;
        let data = Data::from_u8(e_ident[5])
            .ok_or_else(|| ElfError::format("bad ELF data order"))?;
        Ok(Ehdr {
            class,
            data,
            ei_version: e_ident[6],
            os_abi: e_ident[7],
            abi_version: e_ident[8],
            e_type: 0,
            e_machine: 0,
            e_version: 0,
            e_entry: 0,
            e_phoff: 0,
            e_shoff: 0,
            e_flags: 0,
            e_ehsize: 0,
            e_phentsize: 0,
            e_phnum: 0,
            e_shentsize: 0,
            e_shnum: 0,
            e_shstrndx: 0,
        })
    }

    fn read32<E: ByteOrder>(cur: &mut Cursor<&[u8]>) -> Result<Ehdr> {
        let mut hdr = Self::from_ident(Self::read_ident(cur)?)?;
        hdr.e_type = cur.read_u16::<E>()?;
        hdr.e_machine = cur.read_u16::<E>()?;
        hdr.e_version = cur.read_u32::<E>()?;
        hdr.e_entry = cur.read_u32::<E>()? as u64;
        hdr.e_phoff = cur.read_u32::<E>()? as u64;
        hdr.e_shoff = cur.read_u32::<E>()? as u64;
        hdr.e_flags = cur.read_u32::<E>()?;
        hdr.e_ehsize = cur.read_u16::<E>()?;
        hdr.e_phentsize = cur.read_u16::<E>()?;
        hdr.e_phnum = cur.read_u16::<E>()?;
        hdr.e_shentsize = cur.read_u16::<E>()?;
        hdr.e_shnum = cur.read_u16::<E>()?;
        hdr.e_shstrndx = cur.read_u16::<E>()?;
        Ok(hdr)
    }

    fn read64<E: ByteOrder>(cur: &mut Cursor<&[u8]>) -> Result<Ehdr> {
        let mut hdr = Self::from_ident(Self::read_ident(cur)?)?;
        hdr.e_type = cur.read_u16::<E>()?;
        hdr.e_machine = cur.read_u16::<E>()?;
        hdr.e_version = cur.read_u32::<E>()?;
        hdr.e_entry = cur.read_u64::<E>()?;
        hdr.e_phoff = cur.read_u64::<E>()?;
        hdr.e_shoff = cur.read_u64::<E>()?;
        hdr.e_flags = cur.read_u32::<E>()?;
        hdr.e_ehsize = cur.read_u16::<E>()?;
        hdr.e_phentsize = cur.read_u16::<E>()?;
        hdr.e_phnum = cur.read_u16::<E>()?;
        hdr.e_shentsize = cur.read_u16::<E>()?;
        hdr.e_shnum = cur.read_u16::<E>()?;
        hdr.e_shstrndx = cur.read_u16::<E>()?;
        Ok(hdr)
    }
}

/// Layout tags recovered from the first seven bytes of the image.
pub(crate) struct Probe {
    pub class: Class,
    pub data: Data,
}

impl Probe {
    /// Validates the first seven bytes of the image: magic, class tag,
    /// data-order tag, and ident version byte.
    pub(crate) fn check(bytes: &[u8]) -> Result<Probe> {
        if bytes.len() < 7 {
            return Err(io::Error::from(io::ErrorKind::UnexpectedEof).into());
        }
        if bytes[..4] != ELF_MAGIC {
            return Err(ElfError::format("bad ELF magic number"));
        }
        if bytes[6] != EV_CURRENT {
            return Err(ElfError::format("unknown ELF version"));
        }
        let class =
            Class::from_u8(bytes[4]).ok_or_else(|| ElfError::format("bad ELF class"))?;
        let data =
            Data::from_u8(bytes[5]).ok_or_else(|| ElfError::format("bad ELF data order"))?;
        Ok(Probe { class, data })
    }
}
