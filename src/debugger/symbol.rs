use crate::debugger::address::RelocatedAddress;
use crate::debugger::vmmap::{MemoryMap, Region};
use crate::debugger::Error;
use log::debug;
use object::{Object, ObjectKind, ObjectSymbol, SymbolKind};
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq)]
struct SymbolVal {
    /// Address relative to the object file load bias.
    addr: u64,
    size: u64,
    name: String,
}

/// Address ordered function/data symbols of a single object file.
#[derive(Debug, Clone, Default)]
pub struct SymbolTab {
    symbols: Vec<SymbolVal>,
    /// True for position independent objects (shared libraries, PIE executables).
    relocatable: bool,
}

impl SymbolTab {
    pub fn parse(data: &[u8]) -> Result<Self, Error> {
        let object_file = object::File::parse(data)?;
        let mut symbols: Vec<SymbolVal> = object_file
            .symbols()
            .chain(object_file.dynamic_symbols())
            .filter(|s| matches!(s.kind(), SymbolKind::Text | SymbolKind::Data))
            .filter(|s| s.address() != 0)
            .filter_map(|s| {
                let name = s.name().ok().filter(|n| !n.is_empty())?;
                Some(SymbolVal {
                    addr: s.address(),
                    size: s.size(),
                    name: format!("{:#}", rustc_demangle::demangle(name)),
                })
            })
            .collect();
        symbols.sort_unstable_by_key(|s| s.addr);
        symbols.dedup_by_key(|s| s.addr);

        Ok(Self {
            symbols,
            relocatable: object_file.kind() == ObjectKind::Dynamic,
        })
    }

    fn load(path: &Path) -> Result<Self, Error> {
        let data = std::fs::read(path)?;
        Self::parse(&data)
    }

    /// Find symbol that covers an address (address is relative to load bias).
    /// Returns `name` for exact match or `name+0xoff` otherwise.
    pub fn find(&self, addr: u64) -> Option<String> {
        let idx = self.symbols.partition_point(|s| s.addr <= addr);
        let sym = &self.symbols[idx.checked_sub(1)?];
        let offset = addr - sym.addr;
        if offset == 0 {
            return Some(sym.name.clone());
        }
        if offset < sym.size {
            return Some(format!("{}+{offset:#x}", sym.name));
        }
        None
    }

    /// Find address (relative to load bias) of a symbol by its name.
    pub fn find_by_name(&self, name: &str) -> Option<u64> {
        self.symbols.iter().find(|s| s.name == name).map(|s| s.addr)
    }
}

/// Symbol tables of all object files mapped into process memory.
/// Tables are loaded lazily, once per file.
pub struct SymbolRegistry {
    tables: RefCell<HashMap<PathBuf, Option<Rc<SymbolTab>>>>,
}

impl SymbolRegistry {
    pub fn new() -> Self {
        Self {
            tables: RefCell::default(),
        }
    }

    fn table(&self, file: &PathBuf) -> Option<Rc<SymbolTab>> {
        let mut tables = self.tables.borrow_mut();
        tables
            .entry(file.clone())
            .or_insert_with(|| {
                debug!(target: "debugger", "load symbols from {file:?}");
                crate::muted_error!(SymbolTab::load(file), "load symbol table:").map(Rc::new)
            })
            .clone()
    }

    /// Load bias of an object file - the address where its first segment is mapped.
    fn bias(table: &SymbolTab, regions: &[Region]) -> u64 {
        if !table.relocatable {
            return 0;
        }
        regions
            .iter()
            .filter(|r| r.offset == 0)
            .map(|r| r.start.as_u64())
            .min()
            .unwrap_or_default()
    }

    /// Return symbol annotation for an address if any.
    pub fn lookup(&self, vmmap: &MemoryMap, addr: RelocatedAddress) -> Option<String> {
        let region = vmmap.find(addr)?;
        if !region.is_file_backed() {
            return None;
        }
        let file = region.name.as_ref()?;
        let table = self.table(file)?;
        let bias = Self::bias(&table, &vmmap.regions_of(file));
        table.find(addr.as_u64().checked_sub(bias)?)
    }

    /// Find runtime address of a symbol in any mapped object file.
    pub fn address_of(&self, vmmap: &MemoryMap, name: &str) -> Option<RelocatedAddress> {
        let mut files: Vec<PathBuf> = vmmap
            .regions()
            .into_iter()
            .filter(|r| r.is_file_backed())
            .filter_map(|r| r.name)
            .collect();
        files.dedup();

        files.into_iter().find_map(|file| {
            let table = self.table(&file)?;
            let addr = table.find_by_name(name)?;
            let bias = Self::bias(&table, &vmmap.regions_of(&file));
            Some(RelocatedAddress::from(addr + bias))
        })
    }
}

impl Default for SymbolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
