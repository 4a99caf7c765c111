use std::sync::Arc;

use crosscut::aspect::{AdviceRule, AdviceRuleRegistry, HandlerRule, JoinpointKey, ResourceRule, WiringReport};
use crosscut::wildcard::{TokenType, WildcardMatcher, WildcardPattern};

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

fn section(title: &str, palette: &ansi::Palette) {
    println!("\n{}", palette.paint(format!("━━━ {title} ━━━"), ansi::GRAY));
}

fn separator_label(pattern: &WildcardPattern) -> String {
    match pattern.separator() {
        Some(c) => format!("'{c}'"),
        None => "none".to_string(),
    }
}

// --- Patterns ----------------------------------------------------------------

pub fn print_match(pattern: &WildcardPattern, inputs: &[String], color: bool) {
    let palette = ansi::Palette::new(color);
    println!(
        "\n{}  {} {}",
        palette.bold(palette.paint(format!("⚙  Pattern: \"{}\"", pattern), ansi::CYAN)),
        palette.dim("│ separator:"),
        palette.paint(separator_label(pattern), ansi::YELLOW),
    );

    section("Tokens", &palette);
    print_tokens(pattern, &palette);

    section("Inputs", &palette);
    let mut matcher = WildcardMatcher::new(pattern);
    let mut matched = 0;
    for input in inputs {
        if matcher.matches(input) {
            matched += 1;
            let segments: Vec<_> = matcher.segments().map(|s| format!("\"{s}\"")).collect();
            println!(
                "  {} {} {} {}",
                palette.paint("✓", ansi::GREEN),
                palette.bold(input),
                palette.dim("│ segments:"),
                palette.paint(segments.join(", "), ansi::BLUE),
            );
        } else {
            println!("  {} {}", palette.dim("✗"), palette.dim(input));
        }
    }

    section("Summary", &palette);
    println!(
        "  Matched: {}  │  Tried: {}  │  Literal: {}",
        palette.paint(matched.to_string(), ansi::GREEN),
        palette.paint(inputs.len().to_string(), ansi::CYAN),
        palette.dim(pattern.is_literal().to_string()),
    );
    println!();
}

pub fn print_mask(pattern: &WildcardPattern, input: &str, color: bool) {
    let palette = ansi::Palette::new(color);
    println!(
        "\n{}",
        palette.bold(palette.paint(format!("⚙  Masking: \"{}\" with \"{}\"", input, pattern), ansi::CYAN))
    );

    section("Tokens", &palette);
    print_tokens(pattern, &palette);

    section("Mask", &palette);
    match pattern.mask(input) {
        Some(masked) if pattern.matches(input) => {
            println!("  {} {}", palette.paint("✓", ansi::GREEN), palette.bold(palette.paint(masked, ansi::GREEN)));
        }
        Some(masked) => {
            println!("  {} {}", palette.paint("~", ansi::YELLOW), palette.paint(masked, ansi::YELLOW));
            println!("  {}", palette.dim("no match; leading '**' strips leading separators only"));
        }
        None => println!("  {}", palette.dim("✗ no match")),
    }
    println!();
}

fn print_tokens(pattern: &WildcardPattern, palette: &ansi::Palette) {
    let rendered: Vec<String> = pattern
        .token_pairs()
        .map(|(c, ty)| match ty {
            TokenType::Literal => palette.dim(c.to_string()),
            TokenType::Separator => palette.paint(c.to_string(), ansi::YELLOW),
            TokenType::StarStar => palette.paint("**", ansi::BLUE),
            TokenType::End => palette.dim("END"),
            _ => palette.paint(c.to_string(), ansi::BLUE),
        })
        .collect();
    println!("  {}", rendered.join(" "));
}

// --- Advice ------------------------------------------------------------------

pub fn print_resolution(resource: &str, handler: &str, operation: &str, registry: &AdviceRuleRegistry, color: bool) {
    let palette = ansi::Palette::new(color);
    let key = JoinpointKey::new(resource, handler, operation);
    println!("\n{}", palette.bold(palette.paint(format!("⚙  Resolving: {key}"), ansi::CYAN)));

    section("Advice", &palette);
    if registry.is_empty() {
        println!("{}", palette.dim("  No advice applies"));
    } else {
        print_phase("before", registry.before(), &palette);
        print_phase("after", registry.after(), &palette);
        print_phase("finally", registry.finally(), &palette);
        print_phase("thrown", registry.thrown(), &palette);
    }

    if !registry.settings().is_empty() {
        section("Settings", &palette);
        for (name, value) in registry.settings() {
            println!("  {} {} {}", palette.paint(name, ansi::BLUE), palette.dim("="), value);
        }
    }

    section("Summary", &palette);
    println!("  Matched aspects: {}", palette.paint(registry.matched_aspect_count().to_string(), ansi::GREEN));
    println!();
}

fn print_phase(label: &str, advice: &[Arc<AdviceRule>], palette: &ansi::Palette) {
    if advice.is_empty() {
        return;
    }
    println!("  {}", palette.paint(format!("{label}:"), ansi::BLUE));
    for (idx, rule) in advice.iter().enumerate() {
        println!(
            "    {} {} {} {}",
            palette.paint(format!("[{}]", idx), ansi::GRAY),
            palette.bold(palette.paint(&rule.action, ansi::GREEN)),
            palette.dim("│ aspect:"),
            palette.paint(&rule.aspect_id, ansi::CYAN),
        );
    }
}

pub fn print_wiring(report: &WiringReport, resources: &[ResourceRule], handlers: &[HandlerRule], color: bool) {
    let palette = ansi::Palette::new(color);
    println!("\n{}", palette.bold(palette.paint("⚙  Wiring aspects", ansi::CYAN)));

    section("Resources", &palette);
    for resource in resources {
        let scopes: Vec<String> = [
            ("resource", &resource.advice),
            ("request", &resource.request_advice),
            ("content", &resource.content_advice),
            ("response", &resource.response_advice),
        ]
        .into_iter()
        .filter_map(|(name, registry)| registry.as_ref().map(|r| format!("{name}({})", r.matched_aspect_count())))
        .collect();
        if scopes.is_empty() {
            println!("  {} {}", palette.dim("·"), palette.dim(&resource.name));
        } else {
            println!(
                "  {} {} {} {}",
                palette.paint("✓", ansi::GREEN),
                palette.bold(&resource.name),
                palette.dim("│"),
                palette.paint(scopes.join(" "), ansi::BLUE),
            );
        }
    }

    section("Handlers", &palette);
    for handler in handlers {
        let status = if handler.requires_proxy {
            palette.paint("proxy", ansi::GREEN)
        } else if !handler.proxiable {
            palette.dim("not proxiable")
        } else {
            palette.dim("direct")
        };
        println!("  {} {} {}", palette.bold(&handler.id), palette.dim("│"), status);
    }

    if !report.unmatched_aspects.is_empty() {
        println!("\n{}", palette.paint("Aspects that matched no resource:", ansi::YELLOW));
        for id in &report.unmatched_aspects {
            println!("  • {id}");
        }
    }

    section("Summary", &palette);
    println!(
        "  Aspects: {} ({} resource-only)  │  Attachments: {}  │  Proxies: {}",
        palette.paint(report.aspects.to_string(), ansi::CYAN),
        palette.dim(report.resource_only_aspects.to_string()),
        palette.paint(report.attachments.to_string(), ansi::GREEN),
        palette.paint(report.proxied_handlers.to_string(), ansi::YELLOW),
    );
    println!();
}
