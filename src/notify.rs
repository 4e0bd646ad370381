use cozy_core::notify::{Notice, NoticeLevel, Notifier};
use owo_colors::OwoColorize;

/// Prints notices: successes to stdout, errors to stderr.
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Success => println!("{}", notice.message.green()),
            NoticeLevel::Error => eprintln!("{}", notice.message.red()),
        }
    }
}
