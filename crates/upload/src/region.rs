//! Endpoint, signing-region, and service-id mapping per upstream region.
//!
//! `gateway_session::Region` only distinguishes CN/US/HK at the
//! credential level; this table is where that distinction actually picks
//! hosts, matching the "mirror" substitution points in spec §6/§11
//! (`IMAGEX_{US,HK,CN}_MIRROR`).

use gateway_session::Region;

/// The host/service coordinates the upload pipeline signs requests for
/// and PUTs bytes to, for one region.
#[derive(Clone, Debug)]
pub struct RegionEndpoints {
    /// The `imagex` credential/apply/commit host, e.g.
    /// `https://imagex.bytedanceapi.com`. Overridable by the
    /// `IMAGEX_{region}_MIRROR` environment variable.
    pub imagex_host: String,
    /// The main API host (`/mweb/v1/...`) used for `get_upload_token`,
    /// `aigc_draft/generate`, and `get_history_by_ids`. Overridable by
    /// `JIMENG_CN_MIRROR` (CN) or `DREAMINA_{US,HK}_MIRROR`.
    pub mweb_host: String,
    /// The AWS SigV4 region name used in the credential scope.
    pub aws_region: String,
    /// The `ServiceId` upstream associates with "AIGC image upload" in
    /// this region.
    pub service_id: String,
    /// The `Referer`/origin header the apply/commit calls present.
    pub referer: String,
}

impl RegionEndpoints {
    pub fn for_region(region: Region) -> Self {
        match region {
            Region::Cn => Self {
                imagex_host: "https://imagex.bytedanceapi.com".into(),
                mweb_host: "https://jimeng.jianying.com".into(),
                aws_region: "cn-north-1".into(),
                service_id: "efv2r2uwzw".into(),
                referer: "https://jimeng.jianying.com".into(),
            },
            Region::Us => Self {
                imagex_host: "https://imagex-us.bytedanceapi.com".into(),
                mweb_host: "https://dreamina.capcut.com".into(),
                aws_region: "us-east-1".into(),
                service_id: "72bhtbh2eq".into(),
                referer: "https://dreamina.capcut.com".into(),
            },
            Region::Hk => Self {
                imagex_host: "https://imagex-sg.bytedanceapi.com".into(),
                mweb_host: "https://dreamina.capcut.com".into(),
                aws_region: "ap-singapore-1".into(),
                service_id: "gcv1dgqh7d".into(),
                referer: "https://dreamina.capcut.com".into(),
            },
        }
    }

    /// Applies mirror overrides (e.g. from `IMAGEX_US_MIRROR` and
    /// `DREAMINA_US_MIRROR`) if set, leaving everything else from the
    /// static table untouched.
    pub fn with_mirror_overrides(
        mut self,
        imagex_mirror: Option<&str>,
        mweb_mirror: Option<&str>,
    ) -> Self {
        if let Some(mirror) = imagex_mirror {
            self.imagex_host = mirror.trim_end_matches('/').to_string();
        }
        if let Some(mirror) = mweb_mirror {
            self.mweb_host = mirror.trim_end_matches('/').to_string();
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_region_has_distinct_coordinates() {
        let cn = RegionEndpoints::for_region(Region::Cn);
        let us = RegionEndpoints::for_region(Region::Us);
        let hk = RegionEndpoints::for_region(Region::Hk);
        assert_ne!(cn.imagex_host, us.imagex_host);
        assert_ne!(us.imagex_host, hk.imagex_host);
        assert_ne!(cn.aws_region, us.aws_region);
    }

    #[test]
    fn mirror_override_replaces_host_only() {
        let endpoints = RegionEndpoints::for_region(Region::Us)
            .with_mirror_overrides(Some("https://mirror.example.com/"), None);
        assert_eq!(endpoints.imagex_host, "https://mirror.example.com");
        assert_eq!(endpoints.aws_region, "us-east-1");
        assert_eq!(endpoints.mweb_host, "https://dreamina.capcut.com");
    }
}
