use opguard::{ClassificationCache, RebuildMetrics, TypeClassifier, Verb};

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

pub struct Report<'a> {
    pub classifier: &'a TypeClassifier,
    pub cache: &'a ClassificationCache,
    pub metrics: RebuildMetrics,
    pub verbs: &'a [Verb],
}

impl Report<'_> {
    pub fn print(&self, identities: &[String], color: bool) {
        let palette = ansi::Palette::new(color);
        let rules = self.classifier.rules();
        println!(
            "\n{}",
            palette.bold(palette.paint(
                format!(
                    "⚙  Classifying {} identities ({} rules, namespace {})",
                    identities.len(),
                    rules.len(),
                    rules.namespace()
                ),
                ansi::CYAN
            ))
        );

        println!("\n{}", palette.paint("━━━ Classification ━━━", ansi::GRAY));
        for identity in identities {
            self.print_identity(identity, &palette);
        }

        println!("\n{}", palette.paint("━━━ Cache ━━━", ansi::GRAY));
        self.print_cache(&palette);
        println!();
    }

    fn print_identity(&self, identity: &str, palette: &ansi::Palette) {
        let categories = self.classifier.categories(identity);
        let tags = if categories.is_empty() {
            palette.dim("unrestricted")
        } else {
            categories.iter().map(|c| palette.paint(c.as_str(), ansi::BLUE)).collect::<Vec<_>>().join(", ")
        };
        println!("  {} {} {}", palette.bold(identity), palette.dim("│"), tags);

        if categories.is_empty() {
            return;
        }
        let table = self.cache.operations(identity);
        for &verb in self.verbs {
            let operation = match table.get(verb) {
                Some(kind) => palette.paint(kind.as_str(), ansi::GREEN),
                None => palette.dim("-"),
            };
            println!("      {} {}", palette.paint(format!("{:<9}", verb.as_str()), ansi::YELLOW), operation);
        }
    }

    fn print_cache(&self, palette: &ansi::Palette) {
        let stats = self.cache.stats();
        println!(
            "  Generation: {}  │  Entries: {}  │  Restricted: {}",
            palette.paint(self.metrics.generation.to_string(), ansi::BLUE),
            palette.paint(self.metrics.identities.to_string(), ansi::BLUE),
            palette.paint(self.metrics.restricted.to_string(), ansi::YELLOW),
        );
        println!(
            "  Rebuild: {}  │  Hits: {}  │  Misses: {}",
            palette.paint(format!("{:?}", self.metrics.duration), ansi::GREEN),
            palette.paint(stats.hits.to_string(), ansi::GREEN),
            palette.dim(stats.misses.to_string()),
        );
    }
}
