use std::sync::Arc;

use futures::StreamExt;
use futures::TryStreamExt;
use futures::stream;

use super::QueryContext;
use super::arg::ArgValue;
use super::arg::Reference;
use crate::error::Error;
use crate::json_ext::Value;

/// Where a resolved id is written back.
#[derive(Clone, Copy, Debug)]
enum Slot {
    Whole,
    Index(usize),
}

#[derive(Debug)]
struct Target {
    position: usize,
    argument: String,
    slot: Slot,
    reference: Reference,
}

impl QueryContext {
    /// Replaces every object reference in the arguments of the chain with the object's id.
    ///
    /// References are resolved concurrently. If any of them fails the others are dropped
    /// and the chain is left unchanged.
    pub(crate) async fn resolve_references(&mut self) -> Result<(), Error> {
        let targets = self.reference_targets();
        if targets.is_empty() {
            return Ok(());
        }
        tracing::debug!(count = targets.len(), "resolving object references");

        let resolved: Vec<(Target, _)> = stream::iter(targets)
            .map(|target| async move {
                let id = target.reference.resolve().await?;
                Ok::<_, Error>((target, id))
            })
            .buffer_unordered(self.configuration.resolve_limit())
            .try_collect()
            .await?;

        for (target, id) in resolved {
            self.write_back(&target, id)?;
        }
        Ok(())
    }

    fn write_back(&mut self, target: &Target, id: Value) -> Result<(), Error> {
        let slot = self
            .selections
            .get_mut(target.position)
            .map(Arc::make_mut)
            .and_then(|field| field.args.get_mut(&target.argument))
            .and_then(|value| match (target.slot, value) {
                (Slot::Whole, value) => Some(value),
                (Slot::Index(index), ArgValue::List(items)) => items.get_mut(index),
                (Slot::Index(_), _) => None,
            });
        match slot {
            Some(slot) => {
                *slot = ArgValue::Value(id);
                Ok(())
            }
            None => Err(Error::InvalidQuery {
                reason: format!(
                    "no argument '{}' at selection {} to receive the id of a '{}'",
                    target.argument,
                    target.position,
                    target.reference.type_name()
                ),
            }),
        }
    }

    fn reference_targets(&self) -> Vec<Target> {
        let mut targets = Vec::new();
        for (position, field) in self.selections.iter().enumerate() {
            for (argument, value) in &field.args {
                let mut push = |slot, reference: &Reference| {
                    targets.push(Target {
                        position,
                        argument: argument.clone(),
                        slot,
                        reference: reference.clone(),
                    })
                };
                match value {
                    ArgValue::Reference(reference) => push(Slot::Whole, reference),
                    ArgValue::List(items) => {
                        for (index, item) in items.iter().enumerate() {
                            if let ArgValue::Reference(reference) = item {
                                push(Slot::Index(index), reference);
                            }
                        }
                    }
                    ArgValue::Value(_) | ArgValue::Input(_) | ArgValue::NonFinite(_) => {}
                }
            }
        }
        targets
    }
}
