/*!
Reports and heuristics over the successive vote dumps of a single contest.

A [`TimeSeries`] of cumulative [`Snapshot`]s is turned into a [`Report`] with one entry
per dump, which can then be sorted by a [`Metric`] or annotated with [`annotate()`].
[`LostVotes`] and [`FindFraud`] are evaluated on pairs of consecutive dumps.

See the [manual] for the meaning of all the quantities.
*/

mod annotate;
pub mod builder;
mod errors;
mod fraud;
mod lost_votes;
pub mod manual;
mod report;
mod series;
mod snapshot;

pub use crate::annotate::*;
pub use crate::errors::*;
pub use crate::fraud::*;
pub use crate::lost_votes::*;
pub use crate::report::*;
pub use crate::series::*;
pub use crate::snapshot::*;
