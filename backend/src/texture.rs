use super::error::BackendError;
use super::glutils::*;
use gl::{types::*, *};
use std::path::Path;

/// A 2D texture loaded from an image file. Deleted on drop.
#[derive(Debug)]
pub struct Texture {
    id: u32,
    width: usize,
    height: usize,
}

impl Texture {
    /// Loads an image with linear filtering and clamped edges, suitable for palette lookups.
    pub fn load(filename: &Path) -> Result<Texture, BackendError> {
        let params = [
            (TEXTURE_2D, TEXTURE_WRAP_S, CLAMP_TO_EDGE),
            (TEXTURE_2D, TEXTURE_WRAP_T, CLAMP_TO_EDGE),
            (TEXTURE_2D, TEXTURE_MIN_FILTER, LINEAR),
            (TEXTURE_2D, TEXTURE_MAG_FILTER, LINEAR),
        ];
        Self::load_params(filename, &params)
    }

    pub fn load_params(
        filename: &Path,
        params: &[(GLenum, GLenum, GLenum)],
    ) -> Result<Texture, BackendError> {
        unsafe {
            stb_image::stb_image::stbi_set_flip_vertically_on_load(1);
        }
        // decode first, so a bad file never allocates a texture object
        let img = match stb_image::image::load(filename) {
            stb_image::image::LoadResult::ImageF32(_) => {
                return Err(BackendError::ImageLoad {
                    path: filename.to_path_buf(),
                    reason: "32-bit images not supported here".to_string(),
                });
            }
            stb_image::image::LoadResult::ImageU8(img) => img,
            stb_image::image::LoadResult::Error(e) => {
                return Err(BackendError::ImageLoad {
                    path: filename.to_path_buf(),
                    reason: e,
                })
            }
        };

        let format = match img.depth {
            1 => RED,
            4 => RGBA,
            _ => RGB,
        };

        let mut id = 0;
        unsafe { gl::GenTextures(1, &mut id) };
        let texture = Texture {
            id,
            width: img.width,
            height: img.height,
        };
        unsafe { gl::BindTexture(TEXTURE_2D, texture.id) };

        for (t, n, p) in params {
            unsafe { gl::TexParameteri(*t, *n, *p as i32) };
        }

        unsafe {
            gl::TexImage2D(
                TEXTURE_2D,
                0,
                RGBA as i32,
                img.width as i32,
                img.height as i32,
                0,
                format,
                UNSIGNED_BYTE,
                img.data.as_ptr().cast(),
            )
        };
        check_gl_err();
        unsafe { gl::GenerateMipmap(TEXTURE_2D) };

        log::debug!(
            "texture({}): {}x{} from {}",
            texture.id,
            texture.width,
            texture.height,
            filename.display()
        );
        Ok(texture)
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Binds the texture to texture unit `unit`.
    pub fn bind(&self, unit: u32) {
        unsafe {
            gl::ActiveTexture(TEXTURE0 + unit);
            gl::BindTexture(TEXTURE_2D, self.id);
        }
    }
}

impl Drop for Texture {
    fn drop(&mut self) {
        unsafe { gl::DeleteTextures(1, &self.id) };
    }
}
