//! Frontend boundary and parallel program assembly
//!
//! Per-language parsers live outside this crate and implement `Frontend`.
//! `build_all` runs every frontend on its own worker thread - each one
//! populating an independent translation unit - and collects the results
//! over a channel before handing them to the single-threaded merger.

use crate::builder::{GraphBuilder, TranslationUnit};
use crate::linker::{Merger, Program};
use crate::{Error, Result};
use crossbeam::channel;

/// A producer of one translation unit's nodes, edges and declarations.
pub trait Frontend: Send {
    /// Source-language tag stamped on every node this frontend creates
    fn language(&self) -> &str;

    /// Populate the unit through the builder
    fn build(&self, builder: &mut GraphBuilder) -> Result<()>;
}

/// Message sent from construction workers to the coordinator
enum UnitMessage {
    Built { index: usize, unit: TranslationUnit },
    Failed { index: usize, error: Error },
}

/// Construct every frontend's translation unit in parallel, then link
/// them into one program.
///
/// Units are merged in submission order regardless of completion order,
/// which keeps the merge's last-seen-wins attribution deterministic for a
/// fixed frontend list. The first failure (by submission order) wins when
/// several frontends fail.
pub fn build_all(frontends: Vec<Box<dyn Frontend>>) -> Result<Program> {
    if frontends.is_empty() {
        return Err(Error::EmptyProgram);
    }

    let expected = frontends.len();
    let (tx, rx) = channel::unbounded::<UnitMessage>();

    std::thread::scope(|scope| {
        for (index, frontend) in frontends.into_iter().enumerate() {
            let tx = tx.clone();
            scope.spawn(move || {
                let mut builder = GraphBuilder::new(frontend.language());
                let message = match frontend.build(&mut builder) {
                    Ok(()) => UnitMessage::Built {
                        index,
                        unit: builder.finish(),
                    },
                    Err(error) => UnitMessage::Failed { index, error },
                };
                let _ = tx.send(message);
            });
        }
        drop(tx);
    });

    let mut units: Vec<Option<TranslationUnit>> = (0..expected).map(|_| None).collect();
    let mut failure: Option<(usize, Error)> = None;
    for message in rx {
        match message {
            UnitMessage::Built { index, unit } => units[index] = Some(unit),
            UnitMessage::Failed { index, error } => {
                tracing::error!("frontend {} failed: {}", index, error);
                if failure.as_ref().is_none_or(|(i, _)| index < *i) {
                    failure = Some((index, error));
                }
            }
        }
    }
    if let Some((_, error)) = failure {
        return Err(error);
    }

    let units: Vec<TranslationUnit> = units.into_iter().flatten().collect();
    Merger::new(units).run()
}
