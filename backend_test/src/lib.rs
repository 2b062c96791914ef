use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{parse_macro_input, spanned::Spanned, FnArg, Ident, ItemFn, Pat, Signature, Type};

/// Transform an asynchronous test into a synchronous one and inject
/// dependencies. Every test gets its own empty in-memory store.
///
/// Injectable dependencies are [`rocket::local::asynchronous::Client`],
/// `crate::model::Store`, and, when the test names a role, a
/// [`rocket::http::Header`] authorizing requests as a caller with that role.
///
/// Roles are `admin`, `chief` (polling station chief) and `desk` (front desk),
/// e.g. `#[backend_test(admin)]`.
#[proc_macro_attribute]
pub fn backend_test(args: TokenStream, input: TokenStream) -> TokenStream {
    let mut item_fn = parse_macro_input!(input as ItemFn);
    let role = parse_macro_input!(args as Option<Ident>);

    // Work out which role the caller has, if any.
    let role = match role {
        None => None,
        Some(arg) => {
            let variant = match arg.to_string().as_str() {
                "admin" => quote! { Admin },
                "chief" => quote! { PollingStationChief },
                "desk" => quote! { MesaDePartes },
                _ => {
                    return syn::Error::new(arg.span(), "Expected one of `admin`, `chief` or `desk`")
                        .into_compile_error()
                        .into();
                }
            };
            Some(quote! { crate::model::auth::Role::#variant })
        }
    };

    // Extract type information and reject invalid function signatures.
    let test_args = match check_sig(item_fn.sig.clone(), role.is_some()) {
        Ok(args) => args,
        Err(err) => {
            return err.into_compile_error().into();
        }
    };

    // Rename the future so the test can have its original name.
    let name = item_fn.sig.ident.clone();
    let new_name = format_ident!("{}_fut", name);
    item_fn.sig.ident = new_name.clone();

    let auth = match role {
        Some(role) => quote! { crate::auth_header(#role) },
        None => quote! { () },
    };

    // Rewrite the test function.
    quote! {
        #[test]
        fn #name() {
            /// Test setup.
            async fn setup() -> (rocket::local::asynchronous::Client, crate::model::Store) {
                log4rs_test_utils::test_logging::init_logging_once_for(
                    ["tally_backend"],
                    None,
                    None,
                );
                let store: crate::model::Store =
                    std::sync::Arc::new(crate::model::MemoryStore::new());
                let rocket_client = rocket::local::asynchronous::Client::tracked(
                    crate::rocket_for_store(crate::test_figment(), store.clone()),
                )
                .await
                .unwrap();
                (rocket_client, store)
            }

            /// The test itself.
            #item_fn

            let runtime = rocket::tokio::runtime::Builder::new_multi_thread()
                .thread_name("rocket-worker-test-thread")
                .worker_threads(1)
                .enable_all()
                .build()
                .unwrap();

            runtime.block_on(async {
                #[allow(unused_variables)]
                let (rocket_client, store) = setup().await;
                #[allow(unused_variables)]
                let auth = #auth;
                #new_name(#(#test_args),*).await
            });
        }
    }
    .into()
}

/// Ensure the wrapped test is async, extract parameters to inject, and reject unknown parameters.
fn check_sig(sig: Signature, has_role: bool) -> Result<Vec<TokenStream2>, syn::Error> {
    if sig.asyncness.is_none() {
        return Err(syn::Error::new(sig.span(), "Test must be marked `async`"));
    }

    let mut has_client = false;
    let mut has_store = false;
    let mut has_auth = false;
    let mut args = vec![];

    for input in &sig.inputs {
        if let FnArg::Typed(pat_type) = input {
            if let (Pat::Ident(_), Type::Path(type_path)) = (&*pat_type.pat, &*pat_type.ty) {
                // Valid as the last path segment for any type is itself.
                let type_ident = &type_path.path.segments.last().unwrap().ident;
                let (seen, injected, what) = if type_ident == "Client" {
                    (&mut has_client, quote! { rocket_client }, "`rocket::local::asynchronous::Client`")
                } else if type_ident == "Store" {
                    (&mut has_store, quote! { store.clone() }, "`Store`")
                } else if type_ident == "Header" {
                    if !has_role {
                        return Err(syn::Error::new(
                            input.span(),
                            "A `Header` can only be injected when a role is given, e.g. `#[backend_test(admin)]`",
                        ));
                    }
                    (&mut has_auth, quote! { auth.clone() }, "`rocket::http::Header`")
                } else {
                    return Err(unexpected(input));
                };
                if *seen {
                    return Err(syn::Error::new(
                        input.span(),
                        format!("Test cannot accept more than one {what}"),
                    ));
                }
                *seen = true;
                args.push(injected);
                continue;
            }
        }

        return Err(unexpected(input));
    }

    Ok(args)
}

fn unexpected(input: &FnArg) -> syn::Error {
    syn::Error::new(
        input.span(),
        "Expected one of `client_ident: Client`, `store_ident: Store` or `auth_ident: Header`",
    )
}
