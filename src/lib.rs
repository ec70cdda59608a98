//! `secretome` is a crate for deriving consensus secretomes (and, downstream,
//! effector catalogues) from the outputs of several protein prediction tools
//! run across a collection of fungal isolate proteomes.
//!
//! The crate is organized around the order in which a typical analysis runs:
//!
//! - The external predictors (SignalP, TargetP, DeepTMHMM, and EffectorP) are
//!   invoked through the facilities in [`tool`]. Each unit of work (an isolate
//!   or, for DeepTMHMM, a chunk of an isolate's proteome) produces an
//!   [`Outcome`], and a failed unit never aborts the batch.
//! - The flat-file outputs of the three secretion predictors are parsed by the
//!   dedicated line parsers within [`prediction`], and each tool's
//!   [`Extractor`](prediction::Extractor) produces a
//!   [`PassingSet`](prediction::PassingSet) of
//!   [standardized identifiers](identifier::Identifier) for an isolate.
//! - The [`consensus::Filter`] intersects those passing sets and re-extracts
//!   the matching records from the isolate's original FASTA file.
//! - Finally, the [`effector`], [`cluster`], [`matrix`], and [`pfam`] modules
//!   aggregate and report on the filtered proteins.
//!
//! ## Identifier normalization
//!
//! Each tool reports protein identifiers slightly differently. All
//! identifiers are reconciled through [`identifier::normalize()`], which takes
//! the _last_ run of digits within the raw identifier and tags it with the
//! owning isolate.
//!
//! ```
//! use secretome::identifier;
//!
//! assert_eq!(identifier::normalize(">5B_000012", "5B").as_str(), "5B_12");
//! assert_eq!(identifier::normalize("B20_7", "B20").as_str(), "B20_7");
//! ```
//!
//! ## Consensus filtering
//!
//! Below is a representative example of intersecting passing sets and
//! extracting the surviving records from a FASTA file.
//!
//! ```
//! use std::collections::HashSet;
//!
//! use secretome::consensus::Secretome;
//! use secretome::fasta;
//! use secretome::identifier;
//!
//! let ids = |raw: &[&str]| -> HashSet<_> {
//!     raw.iter().map(|id| identifier::normalize(id, "B20")).collect()
//! };
//!
//! let signalp = ids(&["B20_1", "B20_2"]);
//! let targetp = ids(&["B20_2", "B20_3"]);
//! let deeptmhmm = ids(&["B20_2"]);
//!
//! let secretome = Secretome::intersect([&signalp, &targetp, &deeptmhmm]);
//!
//! let data = b">B20_000001\nMKV\n>B20_000002\nMAL\n>B20_000003\nMSS\n";
//! let mut reader = fasta::Reader::new(&data[..]);
//! let extraction = secretome.extract(&mut reader, "B20")?;
//!
//! assert_eq!(extraction.kept().len(), 1);
//! assert_eq!(fasta::name(&extraction.kept()[0]), "B20_000002");
//!
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![warn(rust_2021_compatibility)]
#![warn(missing_debug_implementations)]
#![warn(clippy::missing_docs_in_private_items)]
#![warn(rustdoc::broken_intra_doc_links)]

pub mod chunk;
pub mod cluster;
pub mod config;
pub mod consensus;
pub mod effector;
pub mod fasta;
pub mod identifier;
pub mod isolate;
pub mod matrix;
pub mod outcome;
pub mod pfam;
pub mod prediction;
pub mod reader;
pub mod resolve;
pub mod tool;

pub use config::Config;
pub use identifier::Identifier;
pub use isolate::Isolate;
pub use outcome::BatchReport;
pub use outcome::Outcome;

pub use self::reader::Reader;
