use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct LoginQuery {
    pub target_path: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ConnectQuery {
    pub state: Option<String>,
}
