use crate::error::{ElfError, Result};
use crate::header::{Ehdr, Probe};
use crate::loader::Loader;
use crate::section::{Section, Shdr};
use log::{debug, warn};
use std::rc::Rc;

pub(crate) struct FileImpl {
    loader: Rc<dyn Loader>,
    hdr: Ehdr,
    sections: Vec<Section>,
    invalid_section: Section,
}

/// A parsed ELF image.
///
/// Construction eagerly validates the file header and decodes the whole
/// section header table; section names and contents are left on disk until
/// asked for. `File` is a cheap shared handle: clones refer to the same
/// parsed state.
#[derive(Clone)]
pub struct File {
    m: Rc<FileImpl>,
}

impl File {
    /// Parses the header region served by `loader`.
    ///
    /// The loader handle is shared with every [`Section`] derived from this
    /// file and must serve stable bytes for as long as any of them is alive.
    pub fn new(loader: Rc<dyn Loader>) -> Result<File> {
        // Probe the first seven bytes for the magic number, class, byte
        // order, and ident version.
        let probe = Probe::check(loader.load(0, 7)?)?;

        // Read the real header, whose size depends on the class, and
        // canonicalize it. The probe bytes are not consulted again.
        let raw = loader.load(0, probe.class.ehdr_size() as u64)?;
        let hdr = Ehdr::canonicalize(raw, probe.class, probe.data)?;

        if hdr.e_version != 1 {
            return Err(ElfError::format("bad section ELF version"));
        }
        if hdr.e_shnum > 0 && hdr.e_shstrndx >= hdr.e_shnum {
            return Err(ElfError::format("bad section name string table index"));
        }

        debug!(
            "ELF {:?} {:?}: {} section headers at {:#x}",
            hdr.class, hdr.data, hdr.e_shnum, hdr.e_shoff
        );
        if hdr.e_shnum == 0 {
            warn!("no section headers present");
        }

        // Decode the section header table as one contiguous region.
        let entsize = hdr.e_shentsize as usize;
        let table = loader.load(hdr.e_shoff, hdr.e_shentsize as u64 * hdr.e_shnum as u64)?;
        let mut shdrs = Vec::with_capacity(hdr.e_shnum as usize);
        for i in 0..hdr.e_shnum as usize {
            let entry = &table[i * entsize..(i + 1) * entsize];
            shdrs.push(Shdr::canonicalize(entry, hdr.class, hdr.data)?);
        }

        let m = Rc::new_cyclic(|weak| FileImpl {
            loader,
            hdr,
            sections: shdrs
                .into_iter()
                .map(|sh| Section::new(weak.clone(), sh))
                .collect(),
            invalid_section: Section::invalid(weak.clone()),
        });
        Ok(File { m })
    }

    pub(crate) fn from_impl(m: Rc<FileImpl>) -> File {
        File { m }
    }

    /// The canonical file header.
    pub fn get_header(&self) -> &Ehdr {
        &self.m.hdr
    }

    /// The loader serving this file's bytes.
    pub fn get_loader(&self) -> &Rc<dyn Loader> {
        &self.m.loader
    }

    /// All sections, in section header table order.
    pub fn sections(&self) -> &[Section] {
        &self.m.sections
    }

    /// Looks a section up by name, first match in table order winning.
    ///
    /// Never fails: a miss yields the sentinel section, for which
    /// [`Section::is_valid`] is false. Sections whose name cannot be
    /// resolved are skipped.
    pub fn get_section(&self, name: &str) -> &Section {
        self.m
            .sections
            .iter()
            .find(|sec| sec.get_name().map_or(false, |n| n == name))
            .unwrap_or(&self.m.invalid_section)
    }

    /// Looks a section up by table index.
    ///
    /// Never fails: an out-of-range index yields the sentinel section.
    pub fn get_section_at(&self, index: usize) -> &Section {
        self.m
            .sections
            .get(index)
            .unwrap_or(&self.m.invalid_section)
    }
}

impl std::fmt::Debug for File {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("File")
            .field("hdr", &self.m.hdr)
            .field("sections", &self.m.sections.len())
            .finish()
    }
}
