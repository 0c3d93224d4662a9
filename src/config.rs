//! The config file: parsing, defaults and first-run template install.
//!
//! The grammar is line oriented: `key = value` per non-blank line, `;`
//! starts a comment. Malformed lines are diagnosed and skipped so a typo
//! never takes the session down.
use crate::{
    core::{
        bindings::{keysym_for_name, KeyBinding, ModMask},
        commands::{command_for_name, Command, CommandArg, Direction, ResizeKind},
        Config, Rule,
    },
    pure::{client::ClientState, tree::Layout},
    Color, Error, Result,
};
use std::{
    env, fs,
    path::{Path, PathBuf},
};
use tracing::{info, warn};

/// The template installed to `~/.config/arbor/arbor.conf` on first run.
pub const TEMPLATE: &str = include_str!("../resources/arbor.conf");

/// Resolve the config file location, installing the packaged template when
/// no file exists yet.
pub fn locate_or_install() -> Result<PathBuf> {
    let home = env::var("HOME").map_err(|_| Error::Config {
        line: 0,
        reason: "HOME is not set".to_owned(),
    })?;
    let dir = Path::new(&home).join(".config").join("arbor");
    let path = dir.join("arbor.conf");

    if !path.exists() {
        info!(?path, "no config file found: installing template");
        fs::create_dir_all(&dir)?;
        fs::write(&path, TEMPLATE)?;
    }

    Ok(path)
}

/// Load and parse the config file at `path`.
///
/// IO failures are fatal; individual malformed lines are logged and
/// skipped.
pub fn load(path: &Path) -> Result<Config> {
    let contents = fs::read_to_string(path)?;

    Ok(parse(&contents))
}

/// Parse config file contents, falling back to defaults for anything not
/// specified and skipping lines that fail to parse.
pub fn parse(contents: &str) -> Config {
    let mut config = Config::default();

    for (n, raw) in contents.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with(';') {
            continue;
        }

        if let Err(e) = parse_line(&mut config, n + 1, line) {
            warn!(%e, "skipping config line");
        }
    }

    config
}

fn parse_line(config: &mut Config, n: usize, line: &str) -> Result<()> {
    let err = |reason: String| Error::Config { line: n, reason };

    let (key, value) = line
        .split_once('=')
        .map(|(k, v)| (k.trim(), v.trim()))
        .ok_or_else(|| err("expected 'key = value'".to_owned()))?;

    match key {
        "border_width" => {
            config.border_width = value
                .parse()
                .map_err(|_| err(format!("invalid border_width '{value}'")))?;
        }
        "window_gap" => {
            config.window_gap = value
                .parse()
                .map_err(|_| err(format!("invalid window_gap '{value}'")))?;
        }
        "active_border_color" => {
            config.active_border = Color::try_from(value)
                .map_err(|_| err(format!("invalid active_border_color '{value}'")))?;
        }
        "normal_border_color" => {
            config.normal_border = Color::try_from(value)
                .map_err(|_| err(format!("invalid normal_border_color '{value}'")))?;
        }
        "virtual_desktops" => {
            let n: usize = value
                .parse()
                .map_err(|_| err(format!("invalid virtual_desktops '{value}'")))?;
            if n == 0 {
                return Err(err("virtual_desktops must be at least 1".to_owned()));
            }
            config.virtual_desktops = n;
        }
        "focus_follow_pointer" => config.focus_follow_pointer = parse_bool(value, n)?,
        "focus_follow_spawn" => config.focus_follow_spawn = parse_bool(value, n)?,
        "restore_last_focus" => config.restore_last_focus = parse_bool(value, n)?,
        "exec" => config.startup.push(parse_cmd_vector(value)),
        "rule" => config.rules.push(parse_rule(value, n)?),
        "bind" => config.bindings.push(parse_bind(value, n)?),
        unknown => return Err(err(format!("unknown key '{unknown}'"))),
    }

    Ok(())
}

fn parse_bool(value: &str, n: usize) -> Result<bool> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(Error::Config {
            line: n,
            reason: format!("expected 'true' or 'false', got '{value}'"),
        }),
    }
}

// `[prog, arg, arg]` or a bare program name
fn parse_cmd_vector(value: &str) -> Vec<String> {
    match value.strip_prefix('[').and_then(|v| v.strip_suffix(']')) {
        Some(inner) => inner
            .split(',')
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty())
            .collect(),
        None => vec![value.to_owned()],
    }
}

// `rule = (class), (state), (desktop)`
fn parse_rule(value: &str, n: usize) -> Result<Rule> {
    let err = |reason: String| Error::Config { line: n, reason };

    let fields: Vec<&str> = value
        .split(',')
        .map(|f| {
            f.trim()
                .trim_start_matches('(')
                .trim_end_matches(')')
                .trim()
        })
        .collect();

    let &[class, state, desktop] = fields.as_slice() else {
        return Err(err(format!(
            "expected 'rule = (class), (state), (desktop)', got '{value}'"
        )));
    };

    let state = match state {
        "tiled" => ClientState::Tiled,
        "floated" => ClientState::Floating,
        _ => return Err(err(format!("invalid rule state '{state}'"))),
    };

    let desktop = match desktop.parse::<i64>() {
        Ok(-1) => None,
        Ok(d) if d >= 1 => Some(d as usize),
        _ => return Err(err(format!("invalid rule desktop '{desktop}'"))),
    };

    Ok(Rule {
        class: class.to_owned(),
        state,
        desktop,
    })
}

// `bind = mod[+mod]+key -> func(arg)`
fn parse_bind(value: &str, n: usize) -> Result<KeyBinding> {
    let err = |reason: String| Error::Config { line: n, reason };

    let (lhs, rhs) = value
        .split_once("->")
        .map(|(l, r)| (l.trim(), r.trim()))
        .ok_or_else(|| err(format!("expected 'keys -> func', got '{value}'")))?;

    let mut parts: Vec<&str> = lhs.split('+').map(|p| p.trim()).collect();
    let key_name = parts
        .pop()
        .ok_or_else(|| err("missing key name".to_owned()))?;
    let keysym =
        keysym_for_name(key_name).ok_or_else(|| err(format!("unknown key '{key_name}'")))?;

    let mut mods = ModMask::empty();
    for p in parts {
        mods |= ModMask::try_from(p).map_err(|_| err(format!("unknown modifier '{p}'")))?;
    }

    let (func, raw_arg) = match rhs.split_once('(') {
        Some((f, rest)) => {
            let inner = rest
                .strip_suffix(')')
                .ok_or_else(|| err(format!("unbalanced parentheses in '{rhs}'")))?;
            (f.trim(), Some(inner.trim()))
        }
        None => (rhs, None),
    };

    let command =
        command_for_name(func).ok_or_else(|| err(format!("unknown function '{func}'")))?;
    let arg = match raw_arg {
        Some(raw) => parse_arg(command, raw, n)?,
        None => CommandArg::default(),
    };

    Ok(KeyBinding {
        mods,
        keysym,
        command,
        arg,
    })
}

// An argument is a direction / layout / resize / state symbol, a desktop
// number, or (for run) a bracketed argument vector.
fn parse_arg(command: Command, raw: &str, n: usize) -> Result<CommandArg> {
    let mut arg = CommandArg::default();

    if command == Command::Run {
        arg.cmd = parse_cmd_vector(raw);
        return Ok(arg);
    }

    if let Ok(d) = raw.parse::<usize>() {
        arg.desktop = Some(d);
    } else if let Ok(d) = Direction::try_from(raw) {
        arg.direction = Some(d);
    } else if let Ok(l) = Layout::try_from(raw) {
        arg.layout = Some(l);
    } else if let Ok(r) = ResizeKind::try_from(raw) {
        arg.resize = Some(r);
    } else if raw == "tiled" {
        arg.state = Some(ClientState::Tiled);
    } else if raw == "floated" {
        arg.state = Some(ClientState::Floating);
    } else {
        return Err(Error::Config {
            line: n,
            reason: format!("unknown argument '{raw}'"),
        });
    }

    Ok(arg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use simple_test_case::test_case;

    #[test]
    fn the_template_parses_cleanly() {
        let config = parse(TEMPLATE);

        // every bind line in the template must survive parsing
        let bind_lines = TEMPLATE
            .lines()
            .filter(|l| l.trim().starts_with("bind"))
            .count();
        assert_eq!(config.bindings.len(), bind_lines);
    }

    #[test]
    fn scalar_options_are_applied() {
        let config = parse(
            "border_width = 4\n\
             window_gap = 20\n\
             active_border_color = #ff0000\n\
             virtual_desktops = 3\n\
             focus_follow_pointer = false\n",
        );

        assert_eq!(config.border_width, 4);
        assert_eq!(config.window_gap, 20);
        assert_eq!(config.active_border, Color::from(0xff0000));
        assert_eq!(config.virtual_desktops, 3);
        assert!(!config.focus_follow_pointer);
    }

    #[test_case("border_width = fat"; "bad number")]
    #[test_case("virtual_desktops = 0"; "zero desktops")]
    #[test_case("gravity = down"; "unknown key")]
    #[test_case("bind = hyper+q -> kill"; "unknown modifier")]
    #[test_case("bind = super+q -> launch_rocket"; "unknown function")]
    #[test_case("bind = super+colon -> kill"; "unknown key name")]
    #[test]
    fn bad_lines_are_skipped(line: &str) {
        let config = parse(line);

        assert_eq!(config, Config::default());
    }

    #[test]
    fn rules_parse() {
        let config = parse("rule = (Firefox), (tiled), (2)\nrule = (mpv), (floated), (-1)\n");

        assert_eq!(
            config.rules,
            vec![
                Rule {
                    class: "Firefox".to_owned(),
                    state: ClientState::Tiled,
                    desktop: Some(2),
                },
                Rule {
                    class: "mpv".to_owned(),
                    state: ClientState::Floating,
                    desktop: None,
                },
            ]
        );
    }

    #[test]
    fn binds_parse() {
        let config = parse(
            "bind = super+1 -> switch_desktop(1)\n\
             bind = super+shift+right -> cycle_window(right)\n\
             bind = super+return -> run([alacritty, -e, htop])\n\
             bind = super+w -> kill\n",
        );

        assert_eq!(config.bindings.len(), 4);

        let b = &config.bindings[0];
        assert_eq!(b.mods, ModMask::SUPER);
        assert_eq!(b.keysym, 0x31);
        assert_eq!(b.command, Command::SwitchDesktop);
        assert_eq!(b.arg.desktop, Some(1));

        let b = &config.bindings[1];
        assert_eq!(b.mods, ModMask::SUPER | ModMask::SHIFT);
        assert_eq!(b.arg.direction, Some(Direction::Right));

        let b = &config.bindings[2];
        assert_eq!(b.command, Command::Run);
        assert_eq!(b.arg.cmd, vec!["alacritty", "-e", "htop"]);

        let b = &config.bindings[3];
        assert_eq!(b.command, Command::Close);
        assert_eq!(b.arg, CommandArg::default());
    }

    #[test]
    fn comments_and_blanks_are_ignored() {
        let config = parse("; a comment\n\n   \n; another\n");

        assert_eq!(config, Config::default());
    }
}
