use ndarray::Array1;

/// Layout of the data vector `d` and its covariance against the rows of the design matrix
///
/// The design matrix always has one (phi, theta) row pair per site.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DataOrdering {
    /// `[u_phi_1, .., u_phi_n, u_theta_1, .., u_theta_n]`
    ///
    /// Reproduces the published strain_sphere results. For more than one site the data are
    /// not paired with the design matrix rows of the same site.
    #[default]
    ComponentStacked,
    /// `[u_phi_1, u_theta_1, u_phi_2, u_theta_2, ..]`, each datum against its own design matrix row
    SiteInterleaved,
}

impl DataOrdering {
    /// Positions of the phi and theta data of `i_site` in the data vector
    pub fn data_indices(&self, i_site: usize, n_sites: usize) -> (usize, usize) {
        return match self {
            DataOrdering::ComponentStacked => (i_site, n_sites + i_site),
            DataOrdering::SiteInterleaved => (2 * i_site, 2 * i_site + 1),
        };
    }

    /// Data vector and the diagonal of its covariance, shape = [2 * n_sites]
    pub(crate) fn arrange(&self, u_phi: &Array1<f64>, u_theta: &Array1<f64>, s_phi: &Array1<f64>, s_theta: &Array1<f64>) -> (Array1<f64>, Array1<f64>) {
        let n_sites: usize = u_phi.len();
        let mut d: Array1<f64> = Array1::zeros(2 * n_sites);
        let mut covd_diagonal: Array1<f64> = Array1::zeros(2 * n_sites);
        for i_site in 0..n_sites {
            let (i_phi, i_theta): (usize, usize) = self.data_indices(i_site, n_sites);
            d[i_phi] = u_phi[i_site];
            d[i_theta] = u_theta[i_site];
            covd_diagonal[i_phi] = s_phi[i_site].powi(2);
            covd_diagonal[i_theta] = s_theta[i_site].powi(2);
        }
        return (d, covd_diagonal);
    }
}

#[test]
fn test_data_ordering_arrange() {
    let u_phi: Array1<f64> = Array1::from(vec![1.0, 2.0, 3.0]);
    let u_theta: Array1<f64> = Array1::from(vec![4.0, 5.0, 6.0]);
    let s_phi: Array1<f64> = Array1::from(vec![0.1, 0.2, 0.3]);
    let s_theta: Array1<f64> = Array1::from(vec![0.4, 0.5, 0.6]);

    let (d, covd_diagonal) = DataOrdering::default().arrange(&u_phi, &u_theta, &s_phi, &s_theta);
    assert_eq!(d, Array1::from(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]));
    assert_eq!(covd_diagonal[1], 0.2_f64.powi(2));
    assert_eq!(covd_diagonal[3], 0.4_f64.powi(2));

    let (d, covd_diagonal) = DataOrdering::SiteInterleaved.arrange(&u_phi, &u_theta, &s_phi, &s_theta);
    assert_eq!(d, Array1::from(vec![1.0, 4.0, 2.0, 5.0, 3.0, 6.0]));
    assert_eq!(covd_diagonal[1], 0.4_f64.powi(2));
    assert_eq!(covd_diagonal[2], 0.2_f64.powi(2));
}
