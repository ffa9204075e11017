//! Avatar directory and video history listings

use crate::application::ports::{AvatarDirectory, CatalogError, VideoLibrary};

use super::presenter::Presenter;

/// Handle the `avatars` subcommand
pub async fn handle_avatars_command<D: AvatarDirectory>(
    directory: &D,
    presenter: &Presenter,
) -> Result<(), CatalogError> {
    let avatars = directory.list_avatars().await?;

    if avatars.is_empty() {
        presenter.info("No avatars available. Ask an administrator to add one.");
        return Ok(());
    }

    for avatar in avatars {
        let mut line = avatar.name.clone();
        if let Some(provider_id) = &avatar.provider_avatar_id {
            line.push_str(&format!(" (provider: {})", provider_id));
        }
        presenter.key_value(&avatar.id, &line);
    }

    Ok(())
}

/// Handle the `videos` subcommand
pub async fn handle_videos_command<L: VideoLibrary>(
    library: &L,
    presenter: &Presenter,
) -> Result<(), CatalogError> {
    let videos = library.list_videos().await?;

    if videos.is_empty() {
        presenter.info("No videos yet. Record one with `myavatar -a <avatar>`.");
        return Ok(());
    }

    for video in videos {
        let mut line = format!("{} [{}]", video.title, video.status);
        if let Some(created_at) = &video.created_at {
            line.push_str(&format!(" {}", created_at));
        }
        if let Some(url) = &video.video_url {
            line.push_str(&format!(" {}", url));
        }
        presenter.key_value(&video.id, &line);
    }

    Ok(())
}
