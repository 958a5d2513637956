//! # Shading Reference
//!
//! CPU versions of the functions evaluated per pixel by `shaders/earth.wgsl` and
//! `shaders/atmosphere.wgsl`. They are kept step-for-step identical to the WGSL so that the
//! blending behavior can be checked without a GPU: on the night side the night texture
//! dominates, on the day side the brightened day texture does, clouds only show where the sun
//! shines, and the atmosphere glow fades out past the terminator.
//!
//! All vectors are expected in world space. `normal` and `view_direction` must be unit
//! length, and `view_direction` points from the camera towards the surface.

use nalgebra_glm as glm;

/// Hermite interpolation between `edge0` and `edge1`, as in WGSL's `smoothstep`.
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

pub fn mix(a: glm::Vec3, b: glm::Vec3, t: f32) -> glm::Vec3 {
    a * (1.0 - t) + b * t
}

/// Reflects `incident` about `normal`, as in WGSL's `reflect`.
pub fn reflect(incident: glm::Vec3, normal: glm::Vec3) -> glm::Vec3 {
    incident - normal * (2.0 * glm::dot(&normal, &incident))
}

/// Weight of the day texture over the night texture.
pub fn day_mix(sun_alignment: f32) -> f32 {
    smoothstep(-0.25, 0.5, sun_alignment)
}

/// Weight of the day color over the twilight color in the atmosphere.
pub fn atmosphere_day_mix(sun_alignment: f32) -> f32 {
    smoothstep(-0.5, 1.0, sun_alignment)
}

/// Cloud coverage, masked to the lit side.
pub fn cloud_mix(cloud_sample: f32, day_mix: f32) -> f32 {
    smoothstep(0.5, 1.0, cloud_sample * 1.1) * day_mix
}

/// Rim term: grows towards the silhouette where the view grazes the surface.
pub fn fresnel(view_direction: glm::Vec3, normal: glm::Vec3) -> f32 {
    (glm::dot(&view_direction, &normal) + 1.1).powf(2.0)
}

/// Phong-style highlight strength, masked by the specular channel.
pub fn specular(
    sun_direction: glm::Vec3,
    normal: glm::Vec3,
    view_direction: glm::Vec3,
    specular_sample: f32,
) -> f32 {
    let reflection = reflect(-sun_direction, normal);
    (-glm::dot(&reflection, &view_direction)).max(0.0).powf(10.0) * specular_sample * 0.7
}

/// Inputs of one Earth fragment.
#[derive(Debug, Clone, Copy)]
pub struct EarthSample {
    pub day: glm::Vec3,
    pub night: glm::Vec3,
    /// `r` is the specular mask, `g` the cloud mask.
    pub specular_clouds: glm::Vec2,
    pub normal: glm::Vec3,
    pub view_direction: glm::Vec3,
}

/// Lighting constants of one frame.
#[derive(Debug, Clone, Copy)]
pub struct EarthLight {
    pub sun_direction: glm::Vec3,
    pub atmosphere_day_color: glm::Vec3,
    pub atmosphere_twilight_color: glm::Vec3,
}

/// The intermediate terms of [`shade_earth`], for inspection in tests and tooling.
#[derive(Debug, Clone, Copy)]
pub struct EarthShading {
    pub sun_alignment: f32,
    pub day_mix: f32,
    pub cloud_mix: f32,
    pub fresnel: f32,
    pub atmosphere_day_mix: f32,
    pub specular: f32,
    pub color: glm::Vec3,
}

pub fn shade_earth(sample: &EarthSample, light: &EarthLight) -> EarthShading {
    let white = glm::vec3(1.0, 1.0, 1.0);
    let sun_alignment = glm::dot(&light.sun_direction, &sample.normal);

    let day_mix = day_mix(sun_alignment);
    let mut color = mix(sample.night, sample.day * 2.0, day_mix);

    let cloud_mix = cloud_mix(sample.specular_clouds.y, day_mix);
    color = mix(color, white, cloud_mix);

    let fresnel = fresnel(sample.view_direction, sample.normal);

    let atmosphere_day_mix = atmosphere_day_mix(sun_alignment);
    let atmosphere_color = mix(
        light.atmosphere_twilight_color,
        light.atmosphere_day_color,
        atmosphere_day_mix,
    );
    color = mix(color, atmosphere_color, fresnel * atmosphere_day_mix);

    let specular = specular(
        light.sun_direction,
        sample.normal,
        sample.view_direction,
        sample.specular_clouds.x,
    );
    color += mix(white, atmosphere_color, fresnel) * specular;

    EarthShading {
        sun_alignment,
        day_mix,
        cloud_mix,
        fresnel,
        atmosphere_day_mix,
        specular,
        color,
    }
}

/// Atmosphere glow color and alpha for one back-face fragment.
pub fn shade_atmosphere(
    normal: glm::Vec3,
    view_direction: glm::Vec3,
    light: &EarthLight,
    opacity: f32,
) -> (glm::Vec3, f32) {
    let sun_alignment = glm::dot(&light.sun_direction, &normal);
    let color = mix(
        light.atmosphere_twilight_color,
        light.atmosphere_day_color,
        atmosphere_day_mix(sun_alignment),
    );

    let edge_alpha = smoothstep(0.0, 0.5, glm::dot(&view_direction, &normal));
    let day_alpha = smoothstep(-0.5, 0.0, sun_alignment);
    (color, edge_alpha * day_alpha * opacity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lighting::Lighting;

    fn light() -> EarthLight {
        let lighting = Lighting::default();
        EarthLight {
            sun_direction: glm::vec3(-1.0, 0.0, 0.0),
            atmosphere_day_color: lighting.atmosphere_day_color,
            atmosphere_twilight_color: lighting.atmosphere_twilight_color,
        }
    }

    /// A fragment facing straight at the camera, with its normal along `normal`.
    fn facing(normal: glm::Vec3) -> EarthSample {
        EarthSample {
            day: glm::vec3(0.2, 0.3, 0.4),
            night: glm::vec3(0.05, 0.04, 0.02),
            specular_clouds: glm::vec2(0.0, 0.0),
            normal,
            view_direction: -normal,
        }
    }

    #[test]
    fn smoothstep_edges() {
        assert_eq!(smoothstep(0.0, 1.0, -1.0), 0.0);
        assert_eq!(smoothstep(0.0, 1.0, 2.0), 1.0);
        assert_eq!(smoothstep(0.0, 1.0, 0.5), 0.5);
    }

    #[test]
    fn night_side_shows_the_night_texture() {
        let light = light();
        let mut sample = facing(-light.sun_direction);
        // Full specular and cloud masks: the night side must still ignore both.
        sample.specular_clouds = glm::vec2(1.0, 1.0);
        let shading = shade_earth(&sample, &light);

        assert_eq!(shading.sun_alignment, -1.0);
        assert_eq!(shading.day_mix, 0.0);
        assert_eq!(shading.atmosphere_day_mix, 0.0);
        assert_eq!(shading.cloud_mix, 0.0);
        assert_eq!(shading.specular, 0.0);
        assert!((shading.color - sample.night).norm() < 1e-6);
    }

    #[test]
    fn day_side_shows_the_brightened_day_texture() {
        let light = light();
        let sample = facing(light.sun_direction);
        let shading = shade_earth(&sample, &light);

        assert_eq!(shading.day_mix, 1.0);
        assert_eq!(shading.atmosphere_day_mix, 1.0);
        // Head-on view: the fresnel term is (−1 + 1.1)² = 0.01.
        assert!((shading.fresnel - 0.01).abs() < 1e-5);
        let expected = mix(sample.day * 2.0, light.atmosphere_day_color, 0.01);
        assert!((shading.color - expected).norm() < 1e-5);
    }

    #[test]
    fn clouds_only_show_on_the_day_side() {
        let light = light();
        let mut night = facing(-light.sun_direction);
        night.specular_clouds.y = 1.0;
        let mut day = facing(light.sun_direction);
        day.specular_clouds.y = 1.0;

        assert_eq!(shade_earth(&night, &light).cloud_mix, 0.0);
        assert_eq!(shade_earth(&day, &light).cloud_mix, 1.0);
    }

    #[test]
    fn specular_peaks_when_mirroring_the_sun() {
        let light = light();
        let mut sample = facing(light.sun_direction);
        sample.specular_clouds.x = 1.0;
        let shading = shade_earth(&sample, &light);
        assert!((shading.specular - 0.7).abs() < 1e-5);

        sample.specular_clouds.x = 0.0;
        assert_eq!(shade_earth(&sample, &light).specular, 0.0);
    }

    #[test]
    fn atmosphere_fades_past_the_terminator() {
        let light = light();
        let opacity = 1.0;

        // Back faces: the normal points away from the camera.
        let lit_normal = light.sun_direction;
        let (_, lit_alpha) = shade_atmosphere(lit_normal, lit_normal, &light, opacity);
        let dark_normal = -light.sun_direction;
        let (_, dark_alpha) = shade_atmosphere(dark_normal, dark_normal, &light, opacity);

        assert_eq!(lit_alpha, 1.0);
        assert_eq!(dark_alpha, 0.0);

        let (_, half) = shade_atmosphere(lit_normal, lit_normal, &light, 0.5);
        assert_eq!(half, 0.5);
    }

    #[test]
    fn atmosphere_color_blends_twilight_to_day() {
        let light = light();
        let (day, _) = shade_atmosphere(light.sun_direction, light.sun_direction, &light, 1.0);
        let (twilight, _) =
            shade_atmosphere(-light.sun_direction, -light.sun_direction, &light, 1.0);
        assert!((day - light.atmosphere_day_color).norm() < 1e-6);
        assert!((twilight - light.atmosphere_twilight_color).norm() < 1e-6);
    }
}
