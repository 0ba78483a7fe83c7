mod algorithm;
mod encoding;
mod hyperparams;
mod iter;
mod split;
mod tikz;

pub use algorithm::*;
pub use hyperparams::*;
pub use iter::*;
pub use split::{find_best_split, BestSplit};
pub use tikz::*;
