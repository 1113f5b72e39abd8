use serde::Deserialize;

/// The authenticated account, as returned by `GET /user`
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Account {
    #[serde(default)]
    pub login: Option<String>,
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// One entry of `GET /user/teams`
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Team {
    pub name: String,
    pub organization: Organization,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Organization {
    pub login: String,
}
