use crate::navigation::KeyInput;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modifier {
    Ctrl,
    Alt,
    Shift,
    Meta,
    /// Either Ctrl or Meta, so one binding serves both keyboard layouts.
    CmdOrCtrl,
}

impl Modifier {
    fn parse(input: &str) -> Result<Self, String> {
        match input.trim().to_ascii_lowercase().as_str() {
            "ctrl" | "control" => Ok(Self::Ctrl),
            "alt" | "option" => Ok(Self::Alt),
            "shift" => Ok(Self::Shift),
            "meta" | "cmd" | "command" | "super" | "win" => Ok(Self::Meta),
            "cmdorctrl" | "mod" => Ok(Self::CmdOrCtrl),
            other => Err(format!("unsupported modifier: {other}")),
        }
    }
}

/// A modifier+key combination such as `Ctrl+,`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shortcut {
    pub modifiers: Vec<Modifier>,
    pub key: String,
}

impl Shortcut {
    pub fn matches(&self, input: &KeyInput) -> bool {
        if !self.key.eq_ignore_ascii_case(&input.key) {
            return false;
        }

        let wants = |modifier: Modifier| self.modifiers.contains(&modifier);
        let cmd_or_ctrl = wants(Modifier::CmdOrCtrl);
        let ctrl_ok = if cmd_or_ctrl {
            input.ctrl || input.meta
        } else {
            input.ctrl == wants(Modifier::Ctrl)
        };
        let meta_ok = cmd_or_ctrl || input.meta == wants(Modifier::Meta);

        ctrl_ok && meta_ok && input.alt == wants(Modifier::Alt) && input.shift == wants(Modifier::Shift)
    }
}

pub fn parse_shortcut(input: &str) -> Result<Shortcut, String> {
    let trimmed = input.trim();
    let (head, key) = match trimmed.rsplit_once('+') {
        Some((head, "")) if head.ends_with('+') => (&head[..head.len() - 1], "+"),
        Some((head, key)) => (head, key.trim()),
        None => return Err("shortcut needs at least one modifier".into()),
    };

    if key.is_empty() {
        return Err("shortcut key is missing".into());
    }

    let modifiers = head
        .split('+')
        .map(Modifier::parse)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Shortcut {
        modifiers,
        key: key.to_string(),
    })
}
