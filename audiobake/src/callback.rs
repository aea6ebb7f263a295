//! Callback definitions.

/// Internal macro to generate callback wrapper types.
///
/// `unique` callbacks are boxed `FnMut` closures owned by a single call site.
/// `shared` callbacks are reference-counted `Fn` closures that can be cloned into models.
macro_rules! callback {
    (
        $(#[$meta:meta])*
        unique $vis:vis $name:ident($($arg:ident: $arg_ty:ty),* $(,)?) $(-> $ret:ty)?
    ) => {
        $(#[$meta])*
        $vis struct $name {
            callback: Box<dyn FnMut($($arg_ty),*) $(-> $ret)? + Send>,
        }

        impl $name {
            pub fn new<F>(f: F) -> Self
            where
                F: FnMut($($arg_ty),*) $(-> $ret)? + Send + 'static,
            {
                Self {
                    callback: Box::new(f),
                }
            }

            /// Invokes the callback.
            pub fn call(&mut self, $($arg: $arg_ty),*) $(-> $ret)? {
                (self.callback)($($arg),*)
            }
        }

        callback!(@debug $name);
    };
    (
        $(#[$meta:meta])*
        shared $vis:vis $name:ident($($arg:ident: $arg_ty:ty),* $(,)?) $(-> $ret:ty)?
    ) => {
        $(#[$meta])*
        #[derive(Clone)]
        $vis struct $name {
            callback: std::sync::Arc<dyn Fn($($arg_ty),*) $(-> $ret)? + Send + Sync>,
        }

        impl $name {
            pub fn new<F>(f: F) -> Self
            where
                F: Fn($($arg_ty),*) $(-> $ret)? + Send + Sync + 'static,
            {
                Self {
                    callback: std::sync::Arc::new(f),
                }
            }

            /// Invokes the callback.
            pub fn call(&self, $($arg: $arg_ty),*) $(-> $ret)? {
                (self.callback)($($arg),*)
            }
        }

        callback!(@debug $name);
    };
    (@debug $name:ident) => {
        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.debug_struct(stringify!($name))
                    .field("callback", &"<closure>")
                    .finish()
            }
        }
    };
}

pub(crate) use callback;

callback! {
    /// A progress callback for long-running operations.
    ///
    /// Invoked synchronously on the baking thread, between batches.
    ///
    /// # Callback arguments
    ///
    /// - `progress`: Fraction of the function work that has been completed, between 0.0 and 1.0.
    unique pub ProgressCallback(progress: f32)
}

callback! {
    /// Callback for calculating how much air absorption should be applied to a sound based on the distance it traveled.
    ///
    /// # Callback arguments
    ///
    /// - `distance`: the distance (in meters) traveled by the sound.
    /// - `band`: index of the frequency band. 0 = low frequencies, 1 = middle frequencies, 2 = high frequencies.
    ///
    /// # Returns
    ///
    /// The air absorption to apply, between 0.0 and 1.0.
    /// 0.0 = sound in the frequency band `band` is not audible, 1.0 = sound in the frequency band `band` is not attenuated.
    shared pub AirAbsorptionCallback(distance: f32, band: usize) -> f32
}

callback! {
    /// Callback for calculating how much to attenuate a sound based on its directivity pattern and orientation in world space.
    ///
    /// # Callback arguments
    ///
    /// - `direction`: unit vector, in the source's local frame, pointing from the source towards the point being evaluated.
    ///
    /// # Returns
    ///
    /// The directivity value to apply, between 0.0 and 1.0.
    shared pub DirectivityCallback(direction: crate::geometry::Vector3) -> f32
}
