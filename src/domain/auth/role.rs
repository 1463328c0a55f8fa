pub const DEFAULT_ROLE: &str = "USER";

pub const PERM_VIEW_USER: &str = "view user";
pub const PERM_VIEW_IMAGE: &str = "view image";
pub const PERM_UPLOAD_IMAGE: &str = "upload image";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Permission {
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct Role {
    pub name: String,
    pub permissions: Vec<Permission>,
}

impl Role {
    pub fn allows(&self, permission: &str) -> bool {
        self.permissions.iter().any(|p| p.name == permission)
    }
}
