use crate::debugger::address::RelocatedAddress;
use crate::debugger::Error;
use log::debug;
use nix::unistd::Pid;
use proc_maps::MapRange;
use std::cell::{Cell, RefCell};
use std::path::{Path, PathBuf};

/// Memory region kind, used for coloring addresses.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RegionKind {
    Stack,
    Heap,
    Code,
    Rwx,
    Data,
    Rodata,
}

impl RegionKind {
    pub const ALL: [RegionKind; 6] = [
        RegionKind::Stack,
        RegionKind::Heap,
        RegionKind::Code,
        RegionKind::Data,
        RegionKind::Rwx,
        RegionKind::Rodata,
    ];

    pub fn title(self) -> &'static str {
        match self {
            RegionKind::Stack => "STACK",
            RegionKind::Heap => "HEAP",
            RegionKind::Code => "CODE",
            RegionKind::Rwx => "RWX",
            RegionKind::Data => "DATA",
            RegionKind::Rodata => "RODATA",
        }
    }
}

/// Single mapped region of a process virtual address space.
#[derive(Clone, Debug, PartialEq)]
pub struct Region {
    pub start: RelocatedAddress,
    pub end: RelocatedAddress,
    pub read: bool,
    pub write: bool,
    pub exec: bool,
    /// Mapped file or pseudo-name like `[stack]`.
    pub name: Option<PathBuf>,
    /// Offset of the mapping in the backing file.
    pub offset: usize,
}

impl Region {
    pub fn contains(&self, addr: RelocatedAddress) -> bool {
        addr >= self.start && addr < self.end
    }

    pub fn kind(&self) -> RegionKind {
        let name = self.name.as_ref().and_then(|n| n.to_str());
        match name {
            Some(n) if n.starts_with("[stack") => RegionKind::Stack,
            Some("[heap]") => RegionKind::Heap,
            _ if self.exec && self.write => RegionKind::Rwx,
            _ if self.exec => RegionKind::Code,
            _ if self.write => RegionKind::Data,
            _ => RegionKind::Rodata,
        }
    }

    /// True if region is backed by a real file (not a pseudo-region like `[vdso]`).
    pub fn is_file_backed(&self) -> bool {
        self.name
            .as_ref()
            .map(|n| n.is_absolute())
            .unwrap_or_default()
    }
}

impl From<&MapRange> for Region {
    fn from(map: &MapRange) -> Self {
        Self {
            start: RelocatedAddress::from(map.start()),
            end: RelocatedAddress::from(map.start() + map.size()),
            read: map.is_read(),
            write: map.is_write(),
            exec: map.is_exec(),
            name: map.filename().map(|p| p.to_path_buf()),
            offset: map.offset,
        }
    }
}

/// Cached view of `/proc/<pid>/maps`.
///
/// A lookup miss triggers a re-read of the maps, so regions mapped after the last
/// lookup (new shared libraries, grown heap) are discovered on demand.
/// Maps are re-read at most once between two calls of [`MemoryMap::invalidate`].
pub struct MemoryMap {
    pid: Pid,
    regions: RefCell<Vec<Region>>,
    stale: Cell<bool>,
}

impl MemoryMap {
    pub fn new(pid: Pid) -> Self {
        Self {
            pid,
            regions: RefCell::default(),
            stale: Cell::new(true),
        }
    }

    /// Allow re-reading mappings on the next miss, must be called when the process stops.
    pub fn invalidate(&self) {
        self.stale.set(true);
    }

    /// Re-read process memory mappings.
    pub fn refresh(&self) -> Result<(), Error> {
        let maps: Vec<MapRange> = proc_maps::get_process_maps(self.pid.as_raw())?;
        let mut regions: Vec<Region> = maps.iter().map(Region::from).collect();
        regions.sort_unstable_by_key(|r| r.start);
        debug!(target: "debugger", "memory map refreshed, {} regions", regions.len());
        *self.regions.borrow_mut() = regions;
        self.stale.set(false);
        Ok(())
    }

    fn lookup(&self, addr: RelocatedAddress) -> Option<Region> {
        let regions = self.regions.borrow();
        let idx = regions.partition_point(|r| r.start <= addr);
        idx.checked_sub(1)
            .map(|i| &regions[i])
            .filter(|r| r.contains(addr))
            .cloned()
    }

    /// Find region that contains an address. Refreshes mappings on cache miss.
    pub fn find(&self, addr: RelocatedAddress) -> Option<Region> {
        if let Some(region) = self.lookup(addr) {
            return Some(region);
        }
        if !self.stale.get() {
            return None;
        }
        crate::muted_error!(self.refresh(), "memory map refresh:")?;
        self.lookup(addr)
    }

    /// All known regions backed by the same file.
    pub fn regions_of(&self, file: &Path) -> Vec<Region> {
        self.regions
            .borrow()
            .iter()
            .filter(|r| r.name.as_deref() == Some(file))
            .cloned()
            .collect()
    }

    pub fn regions(&self) -> Vec<Region> {
        self.regions.borrow().clone()
    }
}
