//! Business-key persistence: each table is described by an [`Entity`] and
//! stored through [`Tracked`].

pub mod entities;
pub mod entity;

pub use entities::{
    Application, Compiler, DimensionIds, Flag, Machine, Mpi, OperatingSystem, ParameterRow,
    Processor, ResultRow, Run, SubRun,
};
pub use entity::{Entity, Tracked, business_key};
