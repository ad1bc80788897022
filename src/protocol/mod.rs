//! A line-based stdin/stdout command protocol, in the same request/id/reply
//! shape the teacher's `LTPServer` used: the caller tags every request
//! with an arbitrary id, and every reply echoes it back prefixed with `=`
//! (success) or `?` (failure).

pub mod options;

use std::io::{self, BufRead, Write};
use std::time::Duration;

use log::{debug, info, warn};

use crate::engine::{BeginPattern, BotEngine, EngineConfig, Player};

pub use options::EngineOptions;

const COMMANDS: &[&str] = &[
    "init",
    "play",
    "undo",
    "gen_move",
    "gen_move_with_complexity",
    "gen_move_with_time",
    "list_commands",
    "name",
    "version",
    "quit",
];

pub struct EngineServer {
    bot: Option<BotEngine>,
    config: EngineConfig,
}

impl EngineServer {
    pub fn new(config: EngineConfig) -> EngineServer {
        EngineServer { bot: None, config }
    }

    /// Reads commands from `stdin` until EOF or `quit`, writing replies to
    /// `stdout` and flushing after every line, as the protocol requires.
    pub fn run(&mut self) -> anyhow::Result<()> {
        let stdin = io::stdin();
        let mut stdout = io::stdout();

        for line in stdin.lock().lines() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let mut tokens = line.split_whitespace();
            let id = match tokens.next() {
                Some(id) => id,
                None => continue,
            };
            let keyword = match tokens.next() {
                Some(keyword) => keyword,
                None => {
                    writeln!(stdout, "? {id} missing command")?;
                    stdout.flush()?;
                    continue;
                }
            };
            let args: Vec<&str> = tokens.collect();

            debug!("<- {id} {keyword} {}", args.join(" "));
            match self.apply(keyword, &args) {
                Ok(reply) => {
                    writeln!(stdout, "= {id} {keyword}{reply}")?;
                }
                Err(err) => {
                    warn!("{keyword} failed: {err:#}");
                    writeln!(stdout, "? {id} {keyword} {err}")?;
                }
            }
            stdout.flush()?;

            if keyword == "quit" {
                break;
            }
        }
        Ok(())
    }

    fn apply(&mut self, keyword: &str, args: &[&str]) -> anyhow::Result<String> {
        match keyword {
            "init" => self.cmd_init(args),
            "play" => self.cmd_play(args),
            "undo" => self.cmd_undo(args),
            "gen_move" => self.cmd_gen_move(args),
            "gen_move_with_complexity" => self.cmd_gen_move_with_complexity(args),
            "gen_move_with_time" => self.cmd_gen_move_with_time(args),
            "list_commands" => Ok(format!(" {}", COMMANDS.join(" "))),
            "name" => Ok(" Open Points Artificial Intelligence".to_string()),
            "version" => Ok(format!(" {}", env!("CARGO_PKG_VERSION"))),
            "quit" => Ok(String::new()),
            other => anyhow::bail!("unknown command {other}"),
        }
    }

    fn bot_mut(&mut self) -> anyhow::Result<&mut BotEngine> {
        self.bot.as_mut().ok_or_else(|| anyhow::anyhow!("call init before any other command"))
    }

    fn cmd_init(&mut self, args: &[&str]) -> anyhow::Result<String> {
        let width: i32 = args.first().ok_or_else(|| anyhow::anyhow!("init needs a width"))?.parse()?;
        let height: i32 = args.get(1).ok_or_else(|| anyhow::anyhow!("init needs a height"))?.parse()?;
        let begin_pattern = match args.get(2).copied() {
            Some("crosswire") => BeginPattern::Crosswire,
            Some("square") => BeginPattern::Square,
            Some("clean") | None => BeginPattern::Clean,
            Some(other) => anyhow::bail!("unknown begin pattern {other}"),
        };
        let seed: u64 = match args.get(3) {
            Some(s) => s.parse()?,
            None => 0xC0FFEE,
        };
        info!("init {width}x{height} begin_pattern={begin_pattern:?} seed={seed}");
        self.bot = Some(BotEngine::new(width, height, begin_pattern, seed, self.config.clone()));
        Ok(String::new())
    }

    fn cmd_play(&mut self, args: &[&str]) -> anyhow::Result<String> {
        let x: i32 = args.first().ok_or_else(|| anyhow::anyhow!("play needs x"))?.parse()?;
        let y: i32 = args.get(1).ok_or_else(|| anyhow::anyhow!("play needs y"))?.parse()?;
        let player_token = args.get(2).ok_or_else(|| anyhow::anyhow!("play needs a player"))?;
        let player = Player::try_from(*player_token)?;
        self.bot_mut()?.set_player(player);
        self.bot_mut()?.do_step(x, y)?;
        Ok(format!(" {x} {y} {player_token}"))
    }

    fn cmd_undo(&mut self, _args: &[&str]) -> anyhow::Result<String> {
        if self.bot_mut()?.undo_step() {
            Ok(String::new())
        } else {
            anyhow::bail!("nothing to undo")
        }
    }

    fn cmd_gen_move(&mut self, args: &[&str]) -> anyhow::Result<String> {
        let player_token = args.first().ok_or_else(|| anyhow::anyhow!("gen_move needs a player"))?;
        let player = Player::try_from(*player_token)?;
        self.bot_mut()?.set_player(player);
        match self.bot_mut()?.get() {
            Some(mv) => Ok(format!(" {} {} {player_token}", mv.x, mv.y)),
            None => Ok(format!(" -1 -1 {player_token}")),
        }
    }

    fn cmd_gen_move_with_complexity(&mut self, args: &[&str]) -> anyhow::Result<String> {
        let player_token = args.first().ok_or_else(|| anyhow::anyhow!("gen_move_with_complexity needs a player"))?;
        let complexity: u32 = args.get(1).ok_or_else(|| anyhow::anyhow!("gen_move_with_complexity needs a complexity"))?.parse()?;
        let player = Player::try_from(*player_token)?;
        self.bot_mut()?.set_player(player);
        match self.bot_mut()?.get_with_complexity(complexity) {
            Some(mv) => Ok(format!(" {} {} {player_token}", mv.x, mv.y)),
            None => Ok(format!(" -1 -1 {player_token}")),
        }
    }

    fn cmd_gen_move_with_time(&mut self, args: &[&str]) -> anyhow::Result<String> {
        let player_token = args.first().ok_or_else(|| anyhow::anyhow!("gen_move_with_time needs a player"))?;
        let millis: u64 = args.get(1).ok_or_else(|| anyhow::anyhow!("gen_move_with_time needs a millisecond budget"))?.parse()?;
        let player = Player::try_from(*player_token)?;
        let budget = Duration::from_millis(millis);
        self.bot_mut()?.set_player(player);
        match self.bot_mut()?.get_with_time(budget) {
            Some(mv) => Ok(format!(" {} {} {player_token}", mv.x, mv.y)),
            None => Ok(format!(" -1 -1 {player_token}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_then_gen_move_round_trips() {
        let mut server = EngineServer::new(EngineConfig::default());
        server.cmd_init(&["9", "9"]).unwrap();
        let reply = server.cmd_gen_move(&["0"]).unwrap();
        assert!(reply.contains("4 4"));
    }

    #[test]
    fn gen_move_echoes_player_token() {
        let mut server = EngineServer::new(EngineConfig::default());
        server.cmd_init(&["9", "9"]).unwrap();
        let reply = server.cmd_gen_move(&["0"]).unwrap();
        assert_eq!(reply, " 4 4 0");
    }

    #[test]
    fn gen_move_with_time_parses_milliseconds() {
        let mut server = EngineServer::new(EngineConfig::default());
        server.cmd_init(&["9", "9"]).unwrap();
        let reply = server.cmd_gen_move_with_time(&["0", "50"]).unwrap();
        assert_eq!(reply, " 4 4 0");
    }
}
