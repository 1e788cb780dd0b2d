//! Thin query executors over the table heap.
//!
//! Executors follow the pull model: each call to `next` produces one tuple
//! and its record id, or `None` when exhausted. Only the two executors
//! that exercise the storage layer live here — a sequential scan and an
//! insert — plus the minimal in-memory catalog they resolve tables
//! through. Planning, expressions, and transactions belong elsewhere.

use std::collections::HashMap;
use std::sync::Arc;

use crate::heap::{HeapError, RecordId, TableHeap, TableScan};
use crate::storage::{BufferPoolManager, ClockReplacer, DiskManager, Replacer};

/// A tuple is an opaque byte string; schema interpretation is out of scope.
pub type Tuple = Vec<u8>;

/// Identifier of a table in the catalog.
pub type TableOid = u32;

/// A cataloged table: its oid, name, and heap.
pub struct TableInfo<D: DiskManager, R: Replacer = ClockReplacer> {
    pub oid: TableOid,
    pub name: String,
    pub table: TableHeap<D, R>,
}

/// In-memory table directory.
///
/// Maps oids to table heaps so executors can resolve their target table.
/// The catalog is not persisted; it exists to fix the shape of the
/// executor layer.
pub struct Catalog<D: DiskManager, R: Replacer = ClockReplacer> {
    tables: HashMap<TableOid, TableInfo<D, R>>,
    names: HashMap<String, TableOid>,
    next_oid: TableOid,
}

impl<D: DiskManager, R: Replacer> Catalog<D, R> {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self {
            tables: HashMap::new(),
            names: HashMap::new(),
            next_oid: 0,
        }
    }

    /// Creates a new table heap and registers it under `name`.
    pub fn create_table(
        &mut self,
        name: impl Into<String>,
        pool: Arc<BufferPoolManager<D, R>>,
    ) -> Result<TableOid, HeapError> {
        let name = name.into();
        let oid = self.next_oid;
        self.next_oid += 1;

        let table = TableHeap::create(pool)?;
        self.names.insert(name.clone(), oid);
        self.tables.insert(oid, TableInfo { oid, name, table });
        Ok(oid)
    }

    /// Looks up a table by oid.
    pub fn table(&self, oid: TableOid) -> Option<&TableInfo<D, R>> {
        self.tables.get(&oid)
    }

    /// Looks up a table by name.
    pub fn table_by_name(&self, name: &str) -> Option<&TableInfo<D, R>> {
        self.names.get(name).and_then(|oid| self.tables.get(oid))
    }
}

impl<D: DiskManager, R: Replacer> Default for Catalog<D, R> {
    fn default() -> Self {
        Self::new()
    }
}

/// Pull-based executor contract.
///
/// `next` returns the next `(tuple, record id)` pair, or `None` when the
/// operator is exhausted.
pub trait Executor {
    fn next(&mut self) -> Result<Option<(Tuple, RecordId)>, HeapError>;
}

/// Sequential scan over a table heap with an optional predicate.
pub struct SeqScanExecutor<'a, D: DiskManager, R: Replacer = ClockReplacer> {
    scan: TableScan<'a, D, R>,
    predicate: Option<Box<dyn Fn(&[u8]) -> bool + Send + 'a>>,
}

impl<'a, D: DiskManager, R: Replacer> SeqScanExecutor<'a, D, R> {
    /// Creates a scan over `table`.
    ///
    /// With a predicate, tuples for which it returns `false` are skipped.
    pub fn new(
        table: &'a TableHeap<D, R>,
        predicate: Option<Box<dyn Fn(&[u8]) -> bool + Send + 'a>>,
    ) -> Self {
        Self {
            scan: table.scan(),
            predicate,
        }
    }
}

impl<'a, D: DiskManager, R: Replacer> Executor for SeqScanExecutor<'a, D, R> {
    fn next(&mut self) -> Result<Option<(Tuple, RecordId)>, HeapError> {
        while let Some((rid, tuple)) = self.scan.next()? {
            let passes = match &self.predicate {
                Some(predicate) => predicate(&tuple),
                None => true,
            };
            if passes {
                return Ok(Some((tuple, rid)));
            }
        }
        Ok(None)
    }
}

/// Where an insert executor draws its tuples from.
enum InsertSource<'a> {
    /// Literal rows supplied with the plan (a raw insert).
    Raw { rows: Vec<Tuple>, index: usize },
    /// A child operator producing the rows.
    Child(Box<dyn Executor + 'a>),
}

/// Inserts tuples into a table heap.
///
/// Each `next` call inserts one tuple and yields it together with its new
/// record id, so callers can observe what was written and where.
pub struct InsertExecutor<'a, D: DiskManager, R: Replacer = ClockReplacer> {
    table: &'a TableHeap<D, R>,
    source: InsertSource<'a>,
}

impl<'a, D: DiskManager, R: Replacer> InsertExecutor<'a, D, R> {
    /// Creates a raw insert of literal rows.
    pub fn raw(table: &'a TableHeap<D, R>, rows: Vec<Tuple>) -> Self {
        Self {
            table,
            source: InsertSource::Raw { rows, index: 0 },
        }
    }

    /// Creates an insert fed by a child executor.
    pub fn from_child(table: &'a TableHeap<D, R>, child: Box<dyn Executor + 'a>) -> Self {
        Self {
            table,
            source: InsertSource::Child(child),
        }
    }
}

impl<'a, D: DiskManager, R: Replacer> Executor for InsertExecutor<'a, D, R> {
    fn next(&mut self) -> Result<Option<(Tuple, RecordId)>, HeapError> {
        let tuple = match &mut self.source {
            InsertSource::Raw { rows, index } => {
                if *index >= rows.len() {
                    return Ok(None);
                }
                let tuple = rows[*index].clone();
                *index += 1;
                tuple
            }
            InsertSource::Child(child) => match child.next()? {
                Some((tuple, _)) => tuple,
                None => return Ok(None),
            },
        };

        let rid = self.table.insert_tuple(&tuple)?;
        Ok(Some((tuple, rid)))
    }
}
