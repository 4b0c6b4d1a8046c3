//! Static reply content: the command menu and the motivational quote list.

use rand::seq::SliceRandom;

pub const QUOTES: &[&str] = &[
    "Success is not final, failure is not fatal: It is the courage to continue that counts.",
    "Dream big and dare to fail.",
    "Push yourself, because no one else is going to do it for you.",
    "Great things never come from comfort zones.",
    "You are capable of amazing things!",
];

pub fn random_quote() -> &'static str {
    QUOTES
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(QUOTES[0])
}

pub fn menu() -> &'static str {
    "🤖 *Jagwax AI Bot Menu* 🤖\n\
1. *.vv* - Resend view-once media\n\
2. *.menu* - Show this menu\n\
3. *.motivate* - Get a motivational quote\n\
4. *.recover* - Recover deleted messages\n\
5. *.groupinfo* - Show group info\n\
6. *.pair* - Generate pairing code for your number\n\
7. *.status* - View or react to statuses\n\
8. *.welcome* - Activate welcome messages in group\n\
9. *.addcontact <number>* - (Owner only) Add pairing contact\n\
10. *.mycode* - See your pairing code\n\
11. *.help* - Show help and commands\n\
*More features coming soon!*\n"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_quote_comes_from_the_list() {
        for _ in 0..20 {
            assert!(QUOTES.contains(&random_quote()));
        }
    }

    #[test]
    fn menu_lists_every_command() {
        let menu = menu();
        for cmd in [
            ".vv",
            ".menu",
            ".motivate",
            ".recover",
            ".groupinfo",
            ".pair",
            ".status",
            ".welcome",
            ".addcontact",
            ".mycode",
            ".help",
        ] {
            assert!(menu.contains(cmd), "menu missing {cmd}");
        }
    }
}
