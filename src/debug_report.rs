use aimlite::{Answer, Bot, Outcome};

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

pub fn print_load(bot: &Bot, color: bool) {
    let palette = ansi::Palette::new(color);
    let (requested, loaded) = bot.load_progress();
    println!(
        "{} {} {}",
        palette.paint("━━━ Rules ━━━", ansi::GRAY),
        palette.paint(format!("{} categories", bot.category_count()), ansi::GREEN),
        palette.dim(format!("│ {loaded}/{requested} sources loaded")),
    );
}

/// Short line for a request without an answer.
pub fn no_answer(answer: &Answer, color: bool) -> String {
    let palette = ansi::Palette::new(color);
    palette.dim(format!("(no answer: {})", outcome_label(answer.outcome)))
}

pub fn print_turn(answer: &Answer, bot: &Bot, color: bool) {
    let palette = ansi::Palette::new(color);
    println!("\n{}", palette.bold(palette.paint(format!("⚙  Input: \"{}\"", answer.input), ansi::CYAN)));

    println!("\n{}", palette.paint("━━━ Match ━━━", ansi::GRAY));
    print_match(answer, bot, &palette);

    println!("\n{}", palette.paint("━━━ Answer ━━━", ansi::GRAY));
    match &answer.answer {
        Some(text) => println!("  {}", palette.bold(palette.paint(text, ansi::GREEN))),
        None => println!("  {}", palette.dim(outcome_label(answer.outcome))),
    }

    let metrics = &answer.metrics;
    println!("\n{}", palette.paint("━━━ Scan ━━━", ansi::GRAY));
    println!(
        "  Tried: {}  │  That rejected: {}  │  Redirects: {}  │  Depth: {}{}",
        palette.paint(metrics.categories_tried.to_string(), ansi::BLUE),
        palette.paint(metrics.that_rejections.to_string(), ansi::YELLOW),
        palette.paint(metrics.redirects.to_string(), ansi::BLUE),
        palette.paint(metrics.max_depth.to_string(), ansi::BLUE),
        if metrics.redirect_limit_hit { palette.paint("  (limit hit)", ansi::YELLOW) } else { String::new() },
    );

    println!("\n{}", palette.paint("━━━ Timing ━━━", ansi::GRAY));
    println!("  Total: {}", palette.paint(format!("{:?}", metrics.total), ansi::GREEN));
    println!();
}

fn print_match(answer: &Answer, bot: &Bot, palette: &ansi::Palette) {
    let Some(matched) = &answer.matched else {
        println!("{}", palette.dim("  No category matched"));
        if answer.outcome == Outcome::NoMatch {
            println!("\n{}", palette.paint("Possible reasons:", ansi::YELLOW));
            println!("  • No pattern covers the input (matching is anchored at both ends)");
            println!("  • A pattern matched but its <that> did not match the previous answer");
            println!("  • A wildcard met characters outside letters, digits, '-' and apostrophes");
            println!("\n{}", palette.dim(format!("  {} categories loaded", bot.category_count())));
        }
        return;
    };

    println!(
        "  {} {} {} {}",
        palette.paint(format!("[{}]", matched.index), ansi::GRAY),
        palette.bold(palette.paint(&matched.pattern, ansi::GREEN)),
        palette.dim("│"),
        palette.paint(format!("source {}", matched.source.0), ansi::YELLOW),
    );
    if let Some(that) = &matched.that {
        println!("      {} {}", palette.dim("that:"), palette.paint(that, ansi::BLUE));
    }
    for (idx, capture) in matched.captures.iter().enumerate() {
        println!("      {} {}", palette.dim(format!("star {}:", idx + 1)), palette.paint(capture, ansi::CYAN));
    }
}

fn outcome_label(outcome: Outcome) -> &'static str {
    match outcome {
        Outcome::Matched => "matched",
        Outcome::Empty => "template produced no text",
        Outcome::NoMatch => "no matching category",
        Outcome::RedirectionLimit => "redirect depth limit reached",
        Outcome::LoadTimeout => "rule sources still loading",
    }
}
