use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(name = "inkwash")]
#[command(about = "Animated shanshui landscape for the terminal")]
pub(crate) struct Opts {
    /// Frame rate cap
    #[arg(long, default_value_t = 60)]
    pub(crate) fps: u32,

    /// RNG seed (random if omitted)
    #[arg(long)]
    pub(crate) seed: Option<u64>,

    /// Number of mountain layers
    #[arg(long, default_value_t = 4, value_parser = clap::value_parser!(u8).range(3..=5))]
    pub(crate) layers: u8,

    /// Start with the night palette
    #[arg(long, default_value_t = false)]
    pub(crate) night: bool,
}
