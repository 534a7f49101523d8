#[macro_export]
macro_rules! opt {
    (, $default:ident) => {
        $default
    };
    ($optional:expr, $default:tt) => {
        $optional
    };
}

#[macro_export]
macro_rules! param_name {
    ($name:ident) => {
        stringify!($name).to_string()
    };
    ($name:literal) => {
        $name.to_string()
    };
}

#[macro_export]
macro_rules! params_internal {
    ($vec:ident, required, $key:expr, $val:expr) => {
        $vec.push(($key, $val.to_string()));
    };
    ($vec:ident, optional, $key:expr, $val:expr) => {
        if let Some(ref v) = $val {
            $vec.push(($key, v.to_string()));
        }
    };
    ($vec:ident, joined, $key:expr, $val:expr) => {
        if !$val.is_empty() {
            $vec.push((
                $key,
                $val.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(","),
            ));
        }
    };
}

/// Build request params for API endpoints as `Vec<(String, String)>`.
/// Keys are either identifiers or string literals (the X API uses dotted names
/// like `tweet.fields`). Lists are sent comma-separated. Example:
/// ```
/// use xr_util::build_params;
///
/// let max_results = 20;
/// let pagination_token: Option<String> = None;
/// let exclude = vec!["retweets", "replies"];
/// let params = build_params! {
///     required "tweet.fields" => "created_at,author_id",
///     required max_results,
///     optional pagination_token,
///     joined exclude,
/// };
/// assert_eq!(params.len(), 3);
/// assert_eq!(params[2], ("exclude".to_string(), "retweets,replies".to_string()));
/// ```
#[macro_export]
macro_rules! build_params {
    (
        $(
            $kind:ident $name:tt $( => $val:expr )?
        ),+ $(,)?
    ) => {
        {
            let mut params: Vec<(String, String)> = Vec::new();
            $(
                $crate::params_internal!(
                    params,
                    $kind,
                    $crate::param_name!($name),
                    $crate::opt!($( $val )?, $name)
                );
            )+
            params
        }
    };
}
