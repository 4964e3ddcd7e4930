use crate::error::{ElfError, Result};
use crate::file::{File, FileImpl};
use crate::header::{Class, Data};
use crate::strtab::Strtab;
use byteorder::{BigEndian, ByteOrder, LittleEndian, ReadBytesExt};
use std::cell::OnceCell;
use std::fmt;
use std::io::Cursor;
use std::rc::{Rc, Weak};

/// Declared type of a section, from the `sh_type` field.
///
/// Only [`SectionType::Strtab`] and [`SectionType::Nobits`] change behavior
/// anywhere in this crate; the rest are carried through for callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SectionType {
    #[default]
    Null,
    Progbits,
    Symtab,
    Strtab,
    Rela,
    Hash,
    Dynamic,
    Note,
    /// Occupies no bytes in the file (`SHT_NOBITS`, e.g. `.bss`).
    Nobits,
    Rel,
    Shlib,
    Dynsym,
    Other(u32),
}

impl SectionType {
    pub fn from_u32(v: u32) -> SectionType {
        match v {
            0 => SectionType::Null,
            1 => SectionType::Progbits,
            2 => SectionType::Symtab,
            3 => SectionType::Strtab,
            4 => SectionType::Rela,
            5 => SectionType::Hash,
            6 => SectionType::Dynamic,
            7 => SectionType::Note,
            8 => SectionType::Nobits,
            9 => SectionType::Rel,
            10 => SectionType::Shlib,
            11 => SectionType::Dynsym,
            v => SectionType::Other(v),
        }
    }
}

/// Canonical section header: every field widened to 64 bits and stored in
/// host byte order.
///
/// Field names follow the standard `Elf64_Shdr`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Shdr {
    /// Offset of this section's name in the section name string table.
    pub sh_name: u32,

    /// Declared section type.
    pub sh_type: SectionType,

    /// Section attribute flags, passed through opaquely.
    pub sh_flags: u64,

    /// Virtual address at execution, if the section is loaded.
    pub sh_addr: u64,

    /// File offset of the section's contents.
    pub sh_offset: u64,

    /// Size of the section's contents in bytes.
    pub sh_size: u64,

    /// Section index link, meaning depends on `sh_type`.
    pub sh_link: u32,

    /// Auxiliary information, meaning depends on `sh_type`.
    pub sh_info: u32,

    /// Required alignment of `sh_addr`.
    pub sh_addralign: u64,

    /// Entry size for sections holding fixed-size records, else 0.
    pub sh_entsize: u64,
}

impl Shdr {
    /// Decodes one section header table entry laid out under
    /// `(class, data)` into the canonical native form.
    pub(crate) fn canonicalize(buf: &[u8], class: Class, data: Data) -> Result<Shdr> {
        let mut cur = Cursor::new(buf);
        match (class, data) {
            (Class::Elf32, Data::Lsb) => Self::read32::<LittleEndian>(&mut cur),
            (Class::Elf32, Data::Msb) => Self::read32::<BigEndian>(&mut cur),
            (Class::Elf64, Data::Lsb) => Self::read64::<LittleEndian>(&mut cur),
            (Class::Elf64, Data::Msb) => Self::read64::<BigEndian>(&mut cur),
        }
    }

    fn read32<E: ByteOrder>(cur: &mut Cursor<&[u8]>) -> Result<Shdr> {
        Ok(Shdr {
            sh_name: cur.read_u32::<E>()?,
            sh_type: SectionType::from_u32(cur.read_u32::<E>()?),
            sh_flags: cur.read_u32::<E>()? as u64,
            sh_addr: cur.read_u32::<E>()? as u64,
            sh_offset: cur.read_u32::<E>()? as u64,
            sh_size: cur.read_u32::<E>()? as u64,
            sh_link: cur.read_u32::<E>()?,
            sh_info: cur.read_u32::<E>()?,
            sh_addralign: cur.read_u32::<E>()? as u64,
            sh_entsize: cur.read_u32::<E>()? as u64,
        })
    }

    fn read64<E: ByteOrder>(cur: &mut Cursor<&[u8]>) -> Result<Shdr> {
        Ok(Shdr {
            sh_name: cur.read_u32::<E>()?,
            sh_type: SectionType::from_u32(cur.read_u32::<E>()?),
            sh_flags: cur.read_u64::<E>()?,
            sh_addr: cur.read_u64::<E>()?,
            sh_offset: cur.read_u64::<E>()?,
            sh_size: cur.read_u64::<E>()?,
            sh_link: cur.read_u32::<E>()?,
            sh_info: cur.read_u32::<E>()?,
            sh_addralign: cur.read_u64::<E>()?,
            sh_entsize: cur.read_u64::<E>()?,
        })
    }
}

struct SectionImpl {
    file: Weak<FileImpl>,
    hdr: Shdr,
    valid: bool,
    // write-once caches; left empty when resolution fails so a later call
    // retries
    name: OnceCell<String>,
    data: OnceCell<Vec<u8>>,
}

/// One entry of the section header table.
///
/// The header itself is decoded eagerly when the [`File`] is constructed;
/// the section's name and contents are resolved on first access and cached.
/// Cloning is cheap and shares the caches. A `Section` must not outlive the
/// `File` it came from.
#[derive(Clone)]
pub struct Section {
    m: Rc<SectionImpl>,
}

impl Section {
    pub(crate) fn new(file: Weak<FileImpl>, hdr: Shdr) -> Section {
        Section {
            m: Rc::new(SectionImpl {
                file,
                hdr,
                valid: true,
                name: OnceCell::new(),
                data: OnceCell::new(),
            }),
        }
    }

    /// The sentinel returned by lookups that find nothing.
    pub(crate) fn invalid(file: Weak<FileImpl>) -> Section {
        Section {
            m: Rc::new(SectionImpl {
                file,
                hdr: Shdr::default(),
                valid: false,
                name: OnceCell::new(),
                data: OnceCell::new(),
            }),
        }
    }

    fn file(&self) -> File {
        File::from_impl(
            self.m
                .file
                .upgrade()
                .expect("section used after its File was dropped"),
        )
    }

    /// True for every section found in the table, false only for the
    /// sentinel returned by a failed lookup.
    pub fn is_valid(&self) -> bool {
        self.m.valid
    }

    /// The canonical section header.
    pub fn get_header(&self) -> &Shdr {
        &self.m.hdr
    }

    /// Declared size of the section's contents in bytes.
    pub fn size(&self) -> u64 {
        self.m.hdr.sh_size
    }

    /// Resolves the section's name through the file's section name string
    /// table. The first successful resolution is cached.
    pub fn get_name(&self) -> Result<&str> {
        if let Some(name) = self.m.name.get() {
            return Ok(name);
        }
        let file = self.file();
        let shstrndx = file.get_header().e_shstrndx as usize;
        let name = file
            .get_section_at(shstrndx)
            .as_strtab()?
            .get(self.m.hdr.sh_name as u64)?
            .to_owned();
        Ok(self.m.name.get_or_init(|| name))
    }

    /// The section's contents, loaded on first access and cached.
    ///
    /// Sections of type [`SectionType::Nobits`] occupy no file bytes and
    /// yield an empty slice without touching the loader; so does the
    /// sentinel.
    pub fn data(&self) -> Result<&[u8]> {
        if !self.m.valid || self.m.hdr.sh_type == SectionType::Nobits {
            return Ok(&[]);
        }
        if let Some(data) = self.m.data.get() {
            return Ok(data);
        }
        let file = self.file();
        let bytes = file
            .get_loader()
            .load(self.m.hdr.sh_offset, self.m.hdr.sh_size)?
            .to_vec();
        Ok(self.m.data.get_or_init(|| bytes))
    }

    /// Interprets the section as a string table.
    pub fn as_strtab(&self) -> Result<Strtab<'_>> {
        if self.m.hdr.sh_type != SectionType::Strtab {
            return Err(ElfError::TypeMismatch {
                expected: SectionType::Strtab,
                found: self.m.hdr.sh_type,
            });
        }
        Ok(Strtab::new(self.data()?))
    }
}

impl fmt::Debug for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Section")
            .field("valid", &self.m.valid)
            .field("hdr", &self.m.hdr)
            .finish()
    }
}
