use console::{Emoji, style};

pub static SUCCESS_ICON: Emoji<'_, '_> = Emoji("✅ ", "");
pub static INFO_ICON: Emoji<'_, '_> = Emoji("ℹ️  ", "");
pub static WARN_ICON: Emoji<'_, '_> = Emoji("⚠️  ", "");
pub static ERROR_ICON: Emoji<'_, '_> = Emoji("❌ ", "");
pub static GEAR: Emoji<'_, '_> = Emoji("⚙️  ", "");
pub static SPARKLE: Emoji<'_, '_> = Emoji("✨ ", "");

pub fn print_success(msg: &str) {
    println!("{} {}", SUCCESS_ICON, style(msg).green());
}

pub fn print_info(msg: &str) {
    println!("{} {}", INFO_ICON, style(msg).blue());
}

pub fn print_warn(msg: &str) {
    println!("{} {}", WARN_ICON, style(msg).yellow());
}

pub fn print_error(msg: &str) {
    eprintln!("{} {}", ERROR_ICON, style(msg).red().bold());
}

pub fn print_status(label: &str, msg: &str) {
    println!("  {} {}: {}", GEAR, style(label).bold().cyan(), msg);
}

pub fn print_banner() {
    let lines: &[&str] = &[
        "              _                        _   ",
        "   __ _ _   _| |_ ___  _ __   ___  ___| |_ ",
        "  / _` | | | | __/ _ \\| '_ \\ / _ \\/ __| __|",
        " | (_| | |_| | || (_) | |_) | (_) \\__ \\ |_ ",
        "  \\__,_|\\__,_|\\__\\___/| .__/ \\___/|___/\\__|",
        "                      |_|                  ",
    ];

    // Gradient: #34d399 → #22d3ee (left → right)
    let stops = [(52u8, 211u8, 153u8), (34u8, 211u8, 238u8)];
    let max_w = lines.iter().map(|l| l.len()).max().unwrap_or(1) as u32;

    println!();
    for line in lines {
        for (x, ch) in line.chars().enumerate() {
            if ch == ' ' {
                print!(" ");
                continue;
            }
            let t = (x as u32 * 1000 / max_w).min(1000);
            let (r, g, b) = lerp_color(stops[0], stops[1], t);
            print!("\x1b[38;2;{};{};{}m{}", r, g, b, ch);
        }
        println!();
    }
    print!("\x1b[0m");

    println!(
        "\x1b[38;2;34;211;238mDiscord ⇄ n8n social drafts, v{}\x1b[0m\n",
        env!("CARGO_PKG_VERSION")
    );
}

fn lerp_color(a: (u8, u8, u8), b: (u8, u8, u8), t: u32) -> (u8, u8, u8) {
    let r = (a.0 as u32 * (1000 - t) + b.0 as u32 * t) / 1000;
    let g = (a.1 as u32 * (1000 - t) + b.1 as u32 * t) / 1000;
    let b_val = (a.2 as u32 * (1000 - t) + b.2 as u32 * t) / 1000;
    (r as u8, g as u8, b_val as u8)
}

pub fn print_goodbye() {
    println!("\n{} {}", SPARKLE, style("autopost stopped.").bold().cyan());
}

/// A titled block of aligned rows for help and status screens.
pub struct GuideSection {
    title: String,
    rows: Vec<Option<(String, String)>>,
}

impl GuideSection {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            rows: Vec::new(),
        }
    }

    pub fn command(mut self, name: &str, description: &str) -> Self {
        self.rows.push(Some((
            format!("{}", style(name).green()),
            description.to_string(),
        )));
        self
    }

    pub fn status(mut self, label: &str, value: &str) -> Self {
        self.rows
            .push(Some((format!("{}", style(label).cyan()), value.to_string())));
        self
    }

    pub fn blank(mut self) -> Self {
        self.rows.push(None);
        self
    }

    pub fn render(&self) -> String {
        let width = self
            .rows
            .iter()
            .flatten()
            .map(|(left, _)| console::measure_text_width(left))
            .max()
            .unwrap_or(0);
        let mut out = format!("\n {}\n", style(&self.title).bold().underlined());
        for row in &self.rows {
            match row {
                Some((left, right)) => {
                    let pad = width - console::measure_text_width(left);
                    out.push_str(&format!("   {}{}  {}\n", left, " ".repeat(pad), right));
                }
                None => out.push('\n'),
            }
        }
        out
    }

    pub fn print(&self) {
        print!("{}", self.render());
    }
}
