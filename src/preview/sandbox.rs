/// What the rendered document is allowed to do in the display surface.
///
/// Both policies keep the document on the same origin. Only `PermitActiveContent`
/// lets its scripts run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SandboxPolicy {
    #[default]
    Restricted,
    PermitActiveContent,
}

impl SandboxPolicy {
    /// The value of the `sandbox` attribute of the display surface
    pub fn sandbox_attribute(self) -> &'static str {
        match self {
            SandboxPolicy::Restricted => "allow-same-origin",
            SandboxPolicy::PermitActiveContent => "allow-same-origin allow-scripts",
        }
    }

    pub fn from_allow_scripts(allow_scripts: bool) -> Self {
        if allow_scripts {
            SandboxPolicy::PermitActiveContent
        } else {
            SandboxPolicy::Restricted
        }
    }

    pub fn allows_scripts(self) -> bool {
        self == SandboxPolicy::PermitActiveContent
    }

    /// The other policy
    pub fn toggled(self) -> Self {
        SandboxPolicy::from_allow_scripts(!self.allows_scripts())
    }
}
