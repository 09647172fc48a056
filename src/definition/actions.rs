use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Ord, PartialOrd)]
#[repr(u8)]
pub enum Stage {
    Export,
    Generate,
    Configure,
    Build,
    Install,
    Package,
}

impl Stage {
    pub const fn stages() -> [Stage; 6] {
        [
            Stage::Export,
            Stage::Generate,
            Stage::Configure,
            Stage::Build,
            Stage::Install,
            Stage::Package,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Stage::Export => "export",
            Stage::Generate => "generate",
            Stage::Configure => "configure",
            Stage::Build => "build",
            Stage::Install => "install",
            Stage::Package => "package",
        }
    }
}

impl Display for Stage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// External build tool steps a build style is made of.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Action {
    CMakeConfigure,
    CMakeBuild,
    CMakeInstall,
}
