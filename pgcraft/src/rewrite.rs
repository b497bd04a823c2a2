//! The `ngl_texvideo(tex, uv)` rewriter (spec.md §4.J). Not a macro: scanned
//! in the raw source and replaced with a runtime conditional expression keyed
//! on `<tex>_sampling_mode`, since no backend's GLSL preprocessor can branch
//! on a runtime uniform. No teacher file implements this; grounded in spirit
//! on `backend_gl/src/shader/preprocessor.rs`'s hand-written, comment-aware
//! line scanner (used there for `#pragma`/`#include`, here for a token
//! instead of a directive).

use crate::params::{TextureDecl, TextureSemantic};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;

lazy_static! {
    static ref TOKEN_RE: Regex = Regex::new(r"\bngl_texvideo\b").unwrap();
}

/// One conditional branch of the `ngl_texvideo` expansion, gated on whether
/// the active backend supports the corresponding image layout.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub enum SamplingMode {
    MediaCodec,
    Nv12Rectangle,
    Rectangle,
    Nv12,
    Yuv,
}

impl SamplingMode {
    fn enum_name(self) -> &'static str {
        match self {
            SamplingMode::MediaCodec => "MEDIACODEC",
            SamplingMode::Nv12Rectangle => "NV12_RECTANGLE",
            SamplingMode::Rectangle => "RECTANGLE",
            SamplingMode::Nv12 => "NV12",
            SamplingMode::Yuv => "YUV",
        }
    }

    /// Order branches are tried in, matching spec.md §4.J's expansion.
    fn ordered() -> &'static [SamplingMode] {
        &[
            SamplingMode::MediaCodec,
            SamplingMode::Nv12Rectangle,
            SamplingMode::Rectangle,
            SamplingMode::Nv12,
            SamplingMode::Yuv,
        ]
    }

    /// Builds this branch's expansion with `UV_PLACEHOLDER` standing in for
    /// every `uv` occurrence, so the caller can substitute the real
    /// coordinate expression without scanning through `tex` (which may
    /// itself contain the substring "uv", e.g. a texture named `uvTex`).
    fn expr(self, tex: &str) -> String {
        match self {
            SamplingMode::MediaCodec => format!("texture({tex}_oes, {uv})", tex = tex, uv = UV_PLACEHOLDER),
            SamplingMode::Nv12Rectangle => format!(
                "{tex}_color_matrix * vec4(texture({tex}_rect_0, {uv}*textureSize({tex}_rect_0)).r, texture({tex}_rect_1, {uv}*textureSize({tex}_rect_1)).rg, 1.0)",
                tex = tex,
                uv = UV_PLACEHOLDER
            ),
            SamplingMode::Rectangle => {
                format!("texture({tex}_rect_0, {uv}*textureSize({tex}_rect_0))", tex = tex, uv = UV_PLACEHOLDER)
            }
            SamplingMode::Nv12 => format!(
                "{tex}_color_matrix * vec4(texture({tex}, {uv}).r, texture({tex}_1, {uv}).rg, 1.0)",
                tex = tex,
                uv = UV_PLACEHOLDER
            ),
            SamplingMode::Yuv => format!(
                "{tex}_color_matrix * vec4(texture({tex}, {uv}).r, texture({tex}_1, {uv}).r, texture({tex}_2, {uv}).r, 1.0)",
                tex = tex,
                uv = UV_PLACEHOLDER
            ),
        }
    }
}

/// Stands in for `uv` inside `SamplingMode::expr`'s templates. Null bytes
/// can't appear in GLSL source or identifiers, so this can't collide with a
/// texture name or a real coordinate expression.
const UV_PLACEHOLDER: &str = "\u{0}ngl_uv\u{0}";

/// Builds the conditional expansion for one `ngl_texvideo(tex, uv)` call,
/// where `uv` has already had any nested calls rewritten.
fn expand(tex: &str, uv: &str, decl: Option<&TextureDecl>, supported: &[SamplingMode]) -> String {
    let is_video = decl.map(|d| d.semantic == TextureSemantic::Video).unwrap_or(false);
    let clamp = decl.map(|d| d.clamp_video).unwrap_or(false);

    let body = if !is_video {
        format!("texture({tex}, {uv})", tex = tex, uv = uv)
    } else {
        let mut expr = format!("texture({tex}, {uv})", tex = tex, uv = uv);
        for mode in SamplingMode::ordered().iter().rev() {
            if !supported.contains(mode) {
                continue;
            }
            expr = format!(
                "{tex}_sampling_mode == {name} ? {branch} : {rest}",
                tex = tex,
                name = mode.enum_name(),
                branch = mode.expr(tex).replace(UV_PLACEHOLDER, uv),
                rest = expr,
            );
        }
        format!("({})", expr)
    };

    if clamp {
        format!("clamp({}, 0.0, 1.0)", body)
    } else {
        body
    }
}

/// Finds the next word-bounded `ngl_texvideo` occurrence in `src` at or after
/// `from`, skipping over `//` and `/* */` comments so a commented-out call is
/// left untouched.
fn find_outside_comments(src: &str, from: usize) -> Option<usize> {
    let bytes = src.as_bytes();
    let mut i = from;
    while i < bytes.len() {
        if bytes[i] == b'/' && i + 1 < bytes.len() && bytes[i + 1] == b'/' {
            while i < bytes.len() && bytes[i] != b'\n' {
                i += 1;
            }
            continue;
        }
        if bytes[i] == b'/' && i + 1 < bytes.len() && bytes[i + 1] == b'*' {
            i += 2;
            while i + 1 < bytes.len() && !(bytes[i] == b'*' && bytes[i + 1] == b'/') {
                i += 1;
            }
            i = (i + 2).min(bytes.len());
            continue;
        }
        match TOKEN_RE.find(&src[i..]) {
            Some(m) if m.start() == 0 => return Some(i),
            _ => i += 1,
        }
    }
    None
}

/// Finds the index of the `)` matching the `(` at `open_paren`, counting
/// nested parens and skipping comments.
fn find_matching_paren(src: &str, open_paren: usize) -> Option<usize> {
    let bytes = src.as_bytes();
    let mut depth = 0i32;
    let mut i = open_paren;
    while i < bytes.len() {
        if bytes[i] == b'/' && i + 1 < bytes.len() && bytes[i + 1] == b'/' {
            while i < bytes.len() && bytes[i] != b'\n' {
                i += 1;
            }
            continue;
        }
        if bytes[i] == b'/' && i + 1 < bytes.len() && bytes[i + 1] == b'*' {
            i += 2;
            while i + 1 < bytes.len() && !(bytes[i] == b'*' && bytes[i + 1] == b'/') {
                i += 1;
            }
            i = (i + 2).min(bytes.len());
            continue;
        }
        match bytes[i] {
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

/// Splits a two-argument call's inner text at its top-level comma.
fn split_top_level_comma(args: &str) -> Option<(&str, &str)> {
    let bytes = args.as_bytes();
    let mut depth = 0i32;
    for (i, &b) in bytes.iter().enumerate() {
        match b {
            b'(' | b'[' => depth += 1,
            b')' | b']' => depth -= 1,
            b',' if depth == 0 => return Some((&args[..i], &args[i + 1..])),
            _ => {}
        }
    }
    None
}

/// Rewrites every `ngl_texvideo(tex, uv)` call in `src`, recursively
/// resolving nested calls in `uv` before expanding the outer one so inner
/// expansions are already in place when the outer template is built.
/// Scanning always advances past the original call's closing paren, so
/// earlier output is never revisited once a call has been expanded.
pub fn rewrite(src: &str, textures: &HashMap<String, TextureDecl>, supported: &[SamplingMode]) -> String {
    let mut out = String::with_capacity(src.len());
    let mut cursor = 0;
    loop {
        let call_start = match find_outside_comments(src, cursor) {
            Some(p) => p,
            None => {
                out.push_str(&src[cursor..]);
                break;
            }
        };
        let open_paren = match src[call_start..].find('(') {
            Some(rel) => call_start + rel,
            None => {
                out.push_str(&src[cursor..]);
                break;
            }
        };
        let close_paren = match find_matching_paren(src, open_paren) {
            Some(p) => p,
            None => {
                out.push_str(&src[cursor..]);
                break;
            }
        };

        out.push_str(&src[cursor..call_start]);
        let args = &src[open_paren + 1..close_paren];
        if let Some((tex_raw, uv_raw)) = split_top_level_comma(args) {
            let tex_name = tex_raw.trim();
            let uv_processed = rewrite(uv_raw.trim(), textures, supported);
            let decl = textures.get(tex_name);
            out.push_str(&expand(tex_name, &uv_processed, decl, supported));
        } else {
            // malformed call; leave it untouched rather than guess
            out.push_str(&src[call_start..=close_paren]);
        }
        cursor = close_paren + 1;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use ngpu_core::descriptors::{Access, ShaderStageFlags};

    fn video_decl(name: &str) -> TextureDecl {
        TextureDecl {
            name: name.to_string(),
            semantic: TextureSemantic::Video,
            stage_flags: ShaderStageFlags::FRAGMENT,
            access: Access::Read,
            format: None,
            clamp_video: false,
        }
    }

    #[test]
    fn non_video_degenerates_to_plain_sample() {
        let mut textures = HashMap::new();
        textures.insert("tex".to_string(), TextureDecl {
            semantic: TextureSemantic::Tex2d,
            ..video_decl("tex")
        });
        let out = rewrite("vec4 c = ngl_texvideo(tex, uv);", &textures, &[]);
        assert_eq!(out, "vec4 c = texture(tex, uv);");
    }

    #[test]
    fn video_emits_only_supported_branches() {
        let mut textures = HashMap::new();
        textures.insert("tex".to_string(), video_decl("tex"));
        let out = rewrite("ngl_texvideo(tex, uv)", &textures, &[SamplingMode::Nv12]);
        assert!(out.contains("tex_sampling_mode == NV12"));
        assert!(!out.contains("MEDIACODEC"));
        assert!(out.ends_with("texture(tex, uv))"));
    }

    #[test]
    fn nested_call_rewritten_before_outer() {
        let mut textures = HashMap::new();
        textures.insert("a".to_string(), TextureDecl { semantic: TextureSemantic::Tex2d, ..video_decl("a") });
        textures.insert("b".to_string(), TextureDecl { semantic: TextureSemantic::Tex2d, ..video_decl("b") });
        let out = rewrite("ngl_texvideo(a, ngl_texvideo(b, uv).rg)", &textures, &[]);
        assert_eq!(out, "texture(a, texture(b, uv).rg)");
        assert_eq!(out.matches('(').count(), out.matches(')').count());
    }

    #[test]
    fn clamp_video_wraps_expansion() {
        let mut textures = HashMap::new();
        textures.insert("tex".to_string(), TextureDecl { clamp_video: true, ..video_decl("tex") });
        let out = rewrite("ngl_texvideo(tex, uv)", &textures, &[SamplingMode::Nv12]);
        assert!(out.starts_with("clamp("));
        assert!(out.ends_with(", 0.0, 1.0)"));
    }

    #[test]
    fn texture_name_containing_uv_substring_is_not_corrupted() {
        let mut textures = HashMap::new();
        textures.insert("uvTex".to_string(), video_decl("uvTex"));
        let out = rewrite("ngl_texvideo(uvTex, coord)", &textures, &[SamplingMode::Nv12]);
        assert!(out.contains("uvTex_color_matrix"));
        assert!(out.contains("texture(uvTex, coord)"));
        assert!(!out.contains("coordTex"));
    }

    #[test]
    fn commented_out_call_is_untouched() {
        let textures = HashMap::new();
        let src = "/* ngl_texvideo(tex, uv) */\nfoo();";
        let out = rewrite(src, &textures, &[]);
        assert_eq!(out, src);
    }
}
