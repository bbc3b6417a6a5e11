use pdf_writer::{Filter, Pdf, Ref};

use crate::error::Error;
use crate::model::{CoverImage, ImageFormat};

/// Write the cover as an image XObject. JPEG data is passed through as
/// DCT; PNG is decoded to RGB with a soft mask when it carries alpha.
pub(super) fn embed_cover_image(
    pdf: &mut Pdf,
    img: &CoverImage,
    alloc: &mut impl FnMut() -> Ref,
) -> Result<Ref, Error> {
    let xobj_ref = alloc();

    match img.format {
        ImageFormat::Jpeg => {
            let mut xobj = pdf.image_xobject(xobj_ref, &img.data);
            xobj.filter(Filter::DctDecode);
            xobj.width(img.pixel_width as i32);
            xobj.height(img.pixel_height as i32);
            if img.grayscale {
                xobj.color_space().device_gray();
            } else {
                xobj.color_space().device_rgb();
            }
            xobj.bits_per_component(8);
        }
        ImageFormat::Png => {
            let decoded = image::load_from_memory_with_format(&img.data, image::ImageFormat::Png)?;
            let rgba = decoded.to_rgba8();
            let (w, h) = (rgba.width(), rgba.height());
            let has_alpha = rgba.pixels().any(|p| p.0[3] < 255);

            let rgb_data: Vec<u8> = rgba
                .pixels()
                .flat_map(|p| [p.0[0], p.0[1], p.0[2]])
                .collect();
            let compressed_rgb = miniz_oxide::deflate::compress_to_vec_zlib(&rgb_data, 6);

            let smask_ref = if has_alpha {
                let alpha_data: Vec<u8> = rgba.pixels().map(|p| p.0[3]).collect();
                let compressed_alpha = miniz_oxide::deflate::compress_to_vec_zlib(&alpha_data, 6);
                let mask_ref = alloc();
                let mut mask = pdf.image_xobject(mask_ref, &compressed_alpha);
                mask.filter(Filter::FlateDecode);
                mask.width(w as i32);
                mask.height(h as i32);
                mask.color_space().device_gray();
                mask.bits_per_component(8);
                Some(mask_ref)
            } else {
                None
            };

            let mut xobj = pdf.image_xobject(xobj_ref, &compressed_rgb);
            xobj.filter(Filter::FlateDecode);
            xobj.width(w as i32);
            xobj.height(h as i32);
            xobj.color_space().device_rgb();
            xobj.bits_per_component(8);
            if let Some(mask_ref) = smask_ref {
                xobj.s_mask(mask_ref);
            }
        }
    }

    log::debug!(
        "Cover image embedded: {:?} {}x{}px",
        img.format,
        img.pixel_width,
        img.pixel_height
    );
    Ok(xobj_ref)
}
