//! Info-ZIP style compression level flags

use clap::Args;

/// `-0` through `-9`; when several are given the highest wins
#[derive(Args, Debug, Default, Clone)]
pub struct LevelFlags {
    /// Store only, no compression
    #[arg(short = '0')]
    store: bool,
    /// Compress faster
    #[arg(short = '1')]
    fast: bool,
    #[arg(short = '2', hide = true)]
    l2: bool,
    #[arg(short = '3', hide = true)]
    l3: bool,
    #[arg(short = '4', hide = true)]
    l4: bool,
    #[arg(short = '5', hide = true)]
    l5: bool,
    #[arg(short = '6', hide = true)]
    l6: bool,
    #[arg(short = '7', hide = true)]
    l7: bool,
    #[arg(short = '8', hide = true)]
    l8: bool,
    /// Compress better
    #[arg(short = '9')]
    best: bool,
}

impl LevelFlags {
    /// The selected level, or `None` if no level flag was given
    pub fn level(&self) -> Option<i32> {
        let flags = [
            self.store, self.fast, self.l2, self.l3, self.l4, self.l5, self.l6, self.l7, self.l8,
            self.best,
        ];
        flags.iter().rposition(|set| *set).map(|i| i as i32)
    }
}
