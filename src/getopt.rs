//! A small getopt for the shell's own command line.
//!
//! Short options may be clustered (`-vp`) and a short option's argument may be attached (`-dexec`)
//! or given as the next element. Long options are written `--name`, `--name=value` or
//! `--name value`, and may be abbreviated to any unambiguous prefix. Scanning stops at the first
//! non-option element or after `--`.

/// Indicates whether an option takes an argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArgType {
    /// The option takes no arguments.
    #[default]
    NoArgument,
    /// The option takes a required argument.
    RequiredArgument,
}

/// Used to describe the properties of a long-named option.
#[derive(Debug, Clone, Copy)]
pub struct LongOpt<'a> {
    /// The long name of the option.
    pub name: &'a str,
    /// Whether the option takes an argument.
    pub arg_type: ArgType,
    /// If the option is found during scanning, this value will be returned to identify it.
    pub val: char,
}

/// Helper function to create a `LongOpt`.
pub const fn longopt(name: &str, arg_type: ArgType, val: char) -> LongOpt<'_> {
    LongOpt {
        name,
        arg_type,
        val,
    }
}

pub struct Getopter<'opts, 'args> {
    argv: &'args [&'args str],
    /// Stores the argument of an argument-taking option.
    pub optarg: Option<&'args str>,
    /// The optstring for short-named options: each option character, followed by `:` if it
    /// requires an argument.
    shortopts: &'opts str,
    longopts: &'opts [LongOpt<'opts>],
    /// The unscanned rest of the current cluster of short options.
    remaining_text: &'args str,
    /// Index of the next element in `argv` to be scanned. When scanning is finished, this is the
    /// index of the first non-option element.
    pub optind: usize,
    /// The offending option after `?` or `:` was returned.
    pub bad_option: Option<String>,
}

impl<'opts, 'args> Getopter<'opts, 'args> {
    /// `argv[0]` is the program name and is skipped.
    pub fn new(
        shortopts: &'opts str,
        longopts: &'opts [LongOpt<'opts>],
        argv: &'args [&'args str],
    ) -> Self {
        Getopter {
            argv,
            optarg: None,
            shortopts,
            longopts,
            remaining_text: "",
            optind: 1,
            bad_option: None,
        }
    }

    /// Try to get the next option, returning:
    /// * None if there are no more options
    /// * `Some('?')` for unrecognised or ambiguous options
    /// * `Some(':')` for options missing an argument
    /// * `Some(';')` for `--name=value` where `name` takes no argument
    /// * Otherwise, `Some(c)`, where `c` is the option's short character or long option value
    pub fn next_opt(&mut self) -> Option<char> {
        self.optarg = None;
        if self.remaining_text.is_empty() {
            let arg = *self.argv.get(self.optind)?;
            if arg == "--" {
                self.optind += 1;
                return None;
            }
            if !arg.starts_with('-') || arg == "-" {
                return None;
            }
            self.optind += 1;
            if let Some(long) = arg.strip_prefix("--") {
                return Some(self.handle_long_opt(long));
            }
            self.remaining_text = &arg[1..];
        }
        Some(self.handle_short_opt())
    }

    fn handle_short_opt(&mut self) -> char {
        let mut chars = self.remaining_text.chars();
        let Some(c) = chars.next() else {
            return '?';
        };
        self.remaining_text = chars.as_str();

        let spec = match self.shortopts.find(c) {
            Some(pos) if c != ':' => &self.shortopts[pos + c.len_utf8()..],
            _ => {
                self.bad_option = Some(format!("-{}", c));
                return '?';
            }
        };
        if !spec.starts_with(':') {
            return c;
        }

        // This option requires an argument.
        if !self.remaining_text.is_empty() {
            self.optarg = Some(self.remaining_text);
            self.remaining_text = "";
        } else if let Some(next) = self.argv.get(self.optind).copied() {
            self.optarg = Some(next);
            self.optind += 1;
        } else {
            self.bad_option = Some(format!("-{}", c));
            return ':';
        }
        c
    }

    fn handle_long_opt(&mut self, text: &'args str) -> char {
        let (name, value) = match text.split_once('=') {
            Some((name, value)) => (name, Some(value)),
            None => (text, None),
        };

        let longopts = self.longopts;
        let opt = match longopts.iter().find(|opt| opt.name == name) {
            Some(opt) => *opt,
            None => {
                let mut candidates = longopts
                    .iter()
                    .filter(|opt| !name.is_empty() && opt.name.starts_with(name));
                match (candidates.next(), candidates.next()) {
                    (Some(opt), None) => *opt,
                    _ => {
                        self.bad_option = Some(format!("--{}", name));
                        return '?';
                    }
                }
            }
        };

        match (opt.arg_type, value) {
            (ArgType::NoArgument, Some(_)) => {
                self.bad_option = Some(format!("--{}", opt.name));
                ';'
            }
            (ArgType::NoArgument, None) => opt.val,
            (ArgType::RequiredArgument, Some(value)) => {
                self.optarg = Some(value);
                opt.val
            }
            (ArgType::RequiredArgument, None) => match self.argv.get(self.optind).copied() {
                Some(next) => {
                    self.optarg = Some(next);
                    self.optind += 1;
                    opt.val
                }
                None => {
                    self.bad_option = Some(format!("--{}", opt.name));
                    ':'
                }
            },
        }
    }
}
