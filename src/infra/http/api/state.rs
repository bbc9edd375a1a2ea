use std::sync::Arc;

use crate::application::posts::PostService;
use crate::application::probes::ProbeService;
use crate::application::users::UserService;

#[derive(Clone)]
pub struct ApiState {
    pub posts: Arc<PostService>,
    pub users: Arc<UserService>,
    pub probes: Arc<ProbeService>,
}
