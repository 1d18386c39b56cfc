//! Translation of caller options into tool switches

/// Option name that selects the generated project's name instead of being forwarded
const OUTPUT_OPTION: &str = "output";

/// Parsed `flag,flag=value,...` option list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectOptions {
    output: Option<String>,
    switches: Vec<String>,
}

impl ProjectOptions {
    /// Parse a comma-separated option string
    ///
    /// `output=<name>` selects the project name; `name=value` becomes
    /// `--name=value` and a bare `name` becomes `--name`. Empty items are ignored.
    pub fn parse(options: &str) -> Self {
        let mut parsed = Self::default();

        for option in options.split(',').map(str::trim).filter(|o| !o.is_empty()) {
            match option.split_once('=') {
                Some((name, value)) => {
                    let name = name.trim().trim_start_matches('-');
                    if name == OUTPUT_OPTION {
                        parsed.output = Some(value.trim().to_string());
                    } else {
                        parsed.switches.push(format!("--{}={}", name, value));
                    }
                }
                None => parsed
                    .switches
                    .push(format!("--{}", option.trim_start_matches('-'))),
            }
        }

        parsed
    }

    /// Project name requested with `output=`, if any
    pub fn output(&self) -> Option<&str> {
        self.output.as_deref()
    }

    /// Switches to forward to the tool, one argument each, in caller order
    pub fn switches(&self) -> &[String] {
        &self.switches
    }
}

/// A project name must be usable as a single directory and file name
pub fn is_valid_project_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\'])
        && !name.chars().any(char::is_control)
}
