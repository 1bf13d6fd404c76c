use stemma::rules::latin::Latin;
use stemma::{GenSource, Generation, Lemmatizer, LookupMetrics, Resolution, Stem};

mod ansi {
    pub const RESET: &str = "\x1b[0m";
    pub const DIM: &str = "\x1b[2m";
    pub const BOLD: &str = "\x1b[1m";

    pub const GREEN: &str = "\x1b[32m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const BLUE: &str = "\x1b[34m";
    pub const CYAN: &str = "\x1b[36m";
    pub const GRAY: &str = "\x1b[90m";

    pub struct Palette {
        enabled: bool,
    }

    impl Palette {
        pub fn new(enabled: bool) -> Self {
            Self { enabled }
        }

        pub fn paint(&self, s: impl AsRef<str>, color: &str) -> String {
            if self.enabled { format!("{}{}{}", color, s.as_ref(), RESET) } else { s.as_ref().to_string() }
        }

        pub fn bold(&self, s: impl AsRef<str>) -> String {
            if self.enabled { format!("{}{}{}", BOLD, s.as_ref(), RESET) } else { s.as_ref().to_string() }
        }

        pub fn dim(&self, s: impl AsRef<str>) -> String {
            if self.enabled { format!("{}{}{}", DIM, s.as_ref(), RESET) } else { s.as_ref().to_string() }
        }
    }
}

pub fn print_run(
    lemmatizer: &Lemmatizer<Latin>,
    form: &str,
    results: &[Resolution<Latin>],
    metrics: &LookupMetrics,
    color: bool,
) {
    let palette = ansi::Palette::new(color);
    println!("\n{}", palette.bold(palette.paint(format!("⚙  Analyzing: \"{}\"", form), ansi::CYAN)));

    // Per-level search summary
    println!("\n{}", palette.paint("━━━ Levels ━━━", ansi::GRAY));
    print_levels(metrics, &palette);

    // Results
    println!("\n{}", palette.paint("━━━ Results ━━━", ansi::GRAY));
    if results.is_empty() {
        println!("{}", palette.dim("  No analyses produced"));
        println!("\n{}", palette.paint("Possible reasons:", ansi::YELLOW));
        println!("  • No reduction rule recognized the form's ending");
        println!("  • Reductions never bottomed out on a dictionary stem");
        println!("  • Forward verification rejected every speculative derivation");
    } else {
        print_results(lemmatizer, results, &palette);
    }

    // Timing
    println!("\n{}", palette.paint("━━━ Timing ━━━", ansi::GRAY));
    println!("  Total: {}", palette.paint(format!("{:?}", metrics.total), ansi::GREEN));
    println!();
}

fn print_levels(metrics: &LookupMetrics, palette: &ansi::Palette) {
    for level in &metrics.levels {
        println!(
            "  {} {}",
            palette.paint(format!("Level {}:", level.level), ansi::BLUE),
            if level.results > 0 {
                palette.paint(format!("✓ {} results", level.results), ansi::GREEN)
            } else {
                palette.dim(format!("✗ {} results", level.results))
            }
        );
        println!(
            "    {} {}  {} {}  {} {}  {} {}",
            palette.dim("rules:"),
            palette.paint(level.rules.to_string(), ansi::YELLOW),
            palette.dim("steps:"),
            palette.paint(level.steps.to_string(), ansi::YELLOW),
            palette.dim("budget:"),
            palette.paint(level.budget_spent.to_string(), ansi::YELLOW),
            palette.dim("time:"),
            palette.dim(format!("{:?}", level.duration)),
        );
    }
}

fn print_results(lemmatizer: &Lemmatizer<Latin>, results: &[Resolution<Latin>], palette: &ansi::Palette) {
    for (idx, result) in results.iter().enumerate() {
        match result {
            Resolution::Stem(stem) => {
                println!(
                    "  {} {} {} {}",
                    palette.paint(format!("[{}]", idx), ansi::GRAY),
                    palette.bold(palette.paint(stem.form(), ansi::GREEN)),
                    palette.dim("│"),
                    palette.paint(&stem.metadata().key, ansi::BLUE),
                );
                println!("      {}", fmt_headword(lemmatizer, stem, palette));
            }
            Resolution::Derived(generation) => {
                let parsing = generation
                    .metadata()
                    .map(|info| info.key.clone())
                    .unwrap_or_else(|| "(unannotated)".to_string());
                println!(
                    "  {} {} {} {}",
                    palette.paint(format!("[{}]", idx), ansi::GRAY),
                    palette.bold(palette.paint(generation.form(), ansi::GREEN)),
                    palette.dim("│"),
                    palette.paint(parsing, ansi::BLUE),
                );
                print_derivation(lemmatizer, generation, 1, palette);
            }
        }
    }
}

/// Prints one node of the derivation tree and recurses into its sources.
fn print_derivation(
    lemmatizer: &Lemmatizer<Latin>,
    generation: &Generation<Latin>,
    depth: usize,
    palette: &ansi::Palette,
) {
    let indent = "    ".repeat(depth);
    println!(
        "  {}{} {}",
        indent,
        palette.dim("rule:"),
        palette.paint(generation.rule_name(), ansi::CYAN),
    );
    for source in generation.sources() {
        match source {
            GenSource::Stem(stem) => {
                println!(
                    "  {}{} {} {} {}",
                    indent,
                    palette.dim("stem:"),
                    palette.paint(stem.form(), ansi::GREEN),
                    palette.dim("│"),
                    fmt_headword(lemmatizer, stem, palette),
                );
            }
            GenSource::Derived(inner) => {
                println!(
                    "  {}{} {}",
                    indent,
                    palette.dim("from:"),
                    palette.paint(inner.form(), ansi::YELLOW),
                );
                print_derivation(lemmatizer, inner, depth + 1, palette);
            }
        }
    }
}

fn fmt_headword(lemmatizer: &Lemmatizer<Latin>, stem: &Stem<Latin>, palette: &ansi::Palette) -> String {
    match lemmatizer.headword(stem.word()) {
        Some(headword) => format!(
            "{} {}",
            palette.paint(&headword.metadata().lemma, ansi::YELLOW),
            palette.dim(format!("\"{}\"", headword.metadata().gloss)),
        ),
        None => palette.dim("(unknown headword)"),
    }
}
