use std::str::FromStr;

use derive_more::Display;
use thiserror::Error;

/// Named action a role may be allowed to perform.
#[derive(Display, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Permission {
    #[display("getUsers")]
    GetUsers,
    #[display("manageUsers")]
    ManageUsers,
    #[display("addDevice")]
    AddDevice,
    #[display("getDevices")]
    GetDevices,
    #[display("updateDevice")]
    UpdateDevice,
    #[display("deleteDevice")]
    DeleteDevice,
    #[display("manageDeviceTransactions")]
    ManageDeviceTransactions,
    #[display("deleteDeviceTransactions")]
    DeleteDeviceTransactions,
}

const USER_RIGHTS: &[Permission] = &[Permission::GetDevices, Permission::ManageDeviceTransactions];

const ADMIN_RIGHTS: &[Permission] = &[
    Permission::GetUsers,
    Permission::ManageUsers,
    Permission::AddDevice,
    Permission::GetDevices,
    Permission::UpdateDevice,
    Permission::DeleteDevice,
    Permission::ManageDeviceTransactions,
    Permission::DeleteDeviceTransactions,
];

#[derive(Display, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    #[display("user")]
    User,
    #[display("admin")]
    Admin,
}

#[derive(Clone, Debug, Error, PartialEq)]
#[error("{0} is not a known role")]
pub struct RoleInvalidError(String);

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }

    /// Everything this role may do.
    pub fn rights(&self) -> &'static [Permission] {
        match self {
            Role::User => USER_RIGHTS,
            Role::Admin => ADMIN_RIGHTS,
        }
    }

    pub fn grants(&self, permission: Permission) -> bool {
        self.rights().contains(&permission)
    }
}

impl FromStr for Role {
    type Err = RoleInvalidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            _ => Err(RoleInvalidError(s.to_string())),
        }
    }
}
