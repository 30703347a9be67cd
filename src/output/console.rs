//! Console output utilities.

use console::style;

/// Print an info message.
pub fn print_info(message: &str) {
    println!("{} {}", style("INFO").cyan().bold(), message);
}

/// Print a success message.
pub fn print_success(message: &str) {
    println!("{} {}", style("OK").green().bold(), message);
}

/// Print a warning message.
pub fn print_warning(message: &str) {
    println!("{} {}", style("WARN").yellow().bold(), message);
}

/// Print an error message.
pub fn print_error(message: &str) {
    eprintln!("{} {}", style("ERROR").red().bold(), message);
}

/// Print the application banner.
pub fn print_banner() {
    let banner = r#"
╔═══════════════════════════════════════════════════════╗
║     kindle-relay                                      ║
║     Telegram documents to your Kindle                 ║
╚═══════════════════════════════════════════════════════╝
"#;
    println!("{}", style(banner).cyan());
}

/// Print configuration summary.
pub fn print_config_summary(
    recipient: &str,
    channel: &str,
    output_format: &str,
    staging_dir: &str,
) {
    println!();
    println!("{}", style("Configuration:").bold());
    println!("  Recipient: {}", recipient);
    println!("  Delivery:  {}", channel);
    println!("  Format:    {}", output_format);
    println!("  Staging:   {}", staging_dir);
    println!();
}
